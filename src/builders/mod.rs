pub mod pipeline_builder;

pub use pipeline_builder::*;
