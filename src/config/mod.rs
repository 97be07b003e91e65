//! Configuration models for pipelines, pricing, and project defaults.

pub mod app;

pub use app::{AppConfig, PipelineConfig, PricingConfig};
