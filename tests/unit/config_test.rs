//! Tests for configuration validation and loading

use std::io::Write;

use compile_lane::config::app::{RENDER_DELAY_ENV, SYNTAX_DELAY_ENV};
use compile_lane::config::{AppConfig, PipelineConfig, PricingConfig};

#[test]
fn test_defaults_are_valid() {
    let cfg = AppConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.pipelines.syntax_delay_ms, 300);
    assert_eq!(cfg.pipelines.render_delay_ms, 1000);
    assert_eq!(cfg.default_source_path, "/playground.scad");
    assert!((cfg.pricing.material_cost_per_gram() - 157.0).abs() < f64::EPSILON);
}

#[test]
fn test_pipeline_config_invalid_delay() {
    let invalid = PipelineConfig {
        syntax_delay_ms: 0,
        ..PipelineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pipeline_config_invalid_output_path() {
    let invalid = PipelineConfig {
        render_output_path: String::new(),
        ..PipelineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pricing_config_invalid_speed() {
    let invalid = PricingConfig {
        print_speed: 0.0,
        ..PricingConfig::default()
    };
    assert!(invalid.validate().is_err());
    let cfg = AppConfig {
        pricing: invalid,
        ..AppConfig::default()
    };
    assert!(cfg.validate().unwrap_err().starts_with("pricing invalid"));
}

#[test]
fn test_config_from_json_fills_defaults() {
    let cfg = AppConfig::from_json_str(r#"{"pipelines": {"render_delay_ms": 250}}"#).unwrap();
    assert_eq!(cfg.pipelines.render_delay_ms, 250);
    assert_eq!(cfg.pipelines.syntax_delay_ms, 300);
    assert_eq!(cfg.pricing, PricingConfig::default());
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(AppConfig::from_json_str("{not json").is_err());
    assert!(AppConfig::from_json_str(r#"{"pipelines": {"syntax_delay_ms": 0}}"#).is_err());
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"pricing": {{"currency": "$"}}}}"#).unwrap();
    let cfg = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(cfg.pricing.currency, "$");

    let missing = file.path().with_extension("missing");
    assert!(AppConfig::from_file(missing).is_err());
}

#[test]
fn test_config_from_env_overrides_delays() {
    std::env::set_var(SYNTAX_DELAY_ENV, "120");
    std::env::set_var(RENDER_DELAY_ENV, " 800 ");
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.pipelines.syntax_delay_ms, 120);
    assert_eq!(cfg.pipelines.render_delay_ms, 800);

    std::env::set_var(RENDER_DELAY_ENV, "soon");
    assert!(AppConfig::from_env().is_err());

    std::env::remove_var(SYNTAX_DELAY_ENV);
    std::env::remove_var(RENDER_DELAY_ENV);
}
