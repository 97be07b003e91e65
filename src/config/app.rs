//! Pipeline, pricing and application configuration structures.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "COMPILE_LANE_CONFIG";
/// Environment variable overriding the syntax-check debounce delay.
pub const SYNTAX_DELAY_ENV: &str = "COMPILE_LANE_SYNTAX_DELAY_MS";
/// Environment variable overriding the render debounce delay.
pub const RENDER_DELAY_ENV: &str = "COMPILE_LANE_RENDER_DELAY_MS";

/// Debounce and tool-invocation settings for both pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Debounce delay of the syntax-check pipeline in milliseconds.
    pub syntax_delay_ms: u64,
    /// Debounce delay of the render pipeline in milliseconds.
    pub render_delay_ms: u64,
    /// Output path the syntax check asks the tool to write the manifest to.
    pub syntax_output_path: String,
    /// Output path the render asks the tool to write the mesh to.
    pub render_output_path: String,
    /// Directive line prepended to the source for previews.
    pub preview_directive: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            syntax_delay_ms: 300,
            render_delay_ms: 1000,
            syntax_output_path: "out.json".into(),
            render_output_path: "out.stl".into(),
            preview_directive: "$preview=true;".into(),
        }
    }
}

impl PipelineConfig {
    /// Syntax-check debounce delay.
    #[must_use]
    pub const fn syntax_delay(&self) -> Duration {
        Duration::from_millis(self.syntax_delay_ms)
    }

    /// Render debounce delay.
    #[must_use]
    pub const fn render_delay(&self) -> Duration {
        Duration::from_millis(self.render_delay_ms)
    }

    /// Validate pipeline configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.syntax_delay_ms == 0 {
            return Err("syntax_delay_ms must be greater than 0".into());
        }
        if self.render_delay_ms == 0 {
            return Err("render_delay_ms must be greater than 0".into());
        }
        if self.syntax_output_path.trim().is_empty() {
            return Err("syntax_output_path must not be empty".into());
        }
        if self.render_output_path.trim().is_empty() {
            return Err("render_output_path must not be empty".into());
        }
        if self.preview_directive.contains('\n') {
            return Err("preview_directive must be a single line".into());
        }
        Ok(())
    }
}

/// Fixed constants behind the derived print price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Filament price per kilogram.
    pub filament_price: f64,
    /// Printer cost per hour.
    pub print_cost_per_hour: f64,
    /// Print speed constant.
    pub print_speed: f64,
    /// Currency label attached to prices.
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            filament_price: 157_000.0,
            print_cost_per_hour: 1000.0,
            print_speed: 500.0,
            currency: "Rp. ".into(),
        }
    }
}

impl PricingConfig {
    /// Material cost per gram.
    #[must_use]
    pub fn material_cost_per_gram(&self) -> f64 {
        self.filament_price / 1000.0
    }

    /// Validate pricing constants.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if !self.print_speed.is_finite() || self.print_speed <= 0.0 {
            return Err("print_speed must be a positive number".into());
        }
        if !self.filament_price.is_finite() || self.filament_price < 0.0 {
            return Err("filament_price must be a non-negative number".into());
        }
        if !self.print_cost_per_hour.is_finite() || self.print_cost_per_hour < 0.0 {
            return Err("print_cost_per_hour must be a non-negative number".into());
        }
        Ok(())
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pipeline settings.
    pub pipelines: PipelineConfig,
    /// Pricing constants.
    pub pricing: PricingConfig,
    /// Source path used for new projects.
    pub default_source_path: String,
    /// Feature flags enabled on every project.
    pub default_features: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipelines: PipelineConfig::default(),
            pricing: PricingConfig::default(),
            default_source_path: "/playground.scad".into(),
            default_features: vec!["manifold".into(), "fast-csg".into(), "lazy-union".into()],
        }
    }
}

impl AppConfig {
    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns a description prefixed with the failing section.
    pub fn validate(&self) -> Result<(), String> {
        self.pipelines
            .validate()
            .map_err(|e| format!("pipelines invalid: {e}"))?;
        self.pricing
            .validate()
            .map_err(|e| format!("pricing invalid: {e}"))?;
        if self.default_source_path.trim().is_empty() {
            return Err("default_source_path must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load configuration from the environment.
    ///
    /// A `.env` file is loaded first when present. [`CONFIG_PATH_ENV`] names a
    /// JSON file to start from; the delay variables override its values.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable config file or a malformed override.
    pub fn from_env() -> AppResult<Self> {
        // Missing .env files are fine.
        let _ = dotenvy::dotenv();

        let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Some(ms) = read_millis(SYNTAX_DELAY_ENV)? {
            cfg.pipelines.syntax_delay_ms = ms;
        }
        if let Some(ms) = read_millis(RENDER_DELAY_ENV)? {
            cfg.pipelines.render_delay_ms = ms;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn read_millis(var: &str) -> AppResult<Option<u64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{var} must be a whole number of milliseconds, got {raw:?}")),
        Err(_) => Ok(None),
    }
}
