//! Render pipeline: full geometry export plus derived pricing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pricing::{self, PriceQuote};
use super::vars::{define_args, VarBindings};
use crate::config::{PipelineConfig, PricingConfig};
use crate::core::{
    Artifact, Diagnostics, JobRequest, JobResult, LineShift, LogParser, MeshParser, PipelineError,
};

/// Input of one render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// User source text.
    pub source: String,
    /// Virtual path the source is compiled from.
    pub source_path: String,
    /// Variable overrides passed as `-D` arguments.
    #[serde(default)]
    pub vars: VarBindings,
    /// Experimental features passed as `--enable` switches.
    #[serde(default)]
    pub features: Vec<String>,
    /// Extra arguments appended verbatim.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Whether this is a quick preview rather than a full render.
    pub is_preview: bool,
}

/// Outcome of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// Geometry artifact.
    pub artifact: Artifact,
    /// Line-shifted diagnostics.
    pub diagnostics: Diagnostics,
    /// Tool run duration.
    pub elapsed_millis: u64,
    /// Derived price.
    pub quote: PriceQuote,
    /// Currency label for `quote.total_price`.
    pub currency: String,
}

impl RenderOutput {
    /// Rounded total price.
    #[must_use]
    pub const fn total_price(&self) -> f64 {
        self.quote.total_price
    }
}

/// Build the tool invocation for a render, with the shift its prefix implies.
#[must_use]
pub fn render_job_request(cfg: &PipelineConfig, req: &RenderRequest) -> (JobRequest, LineShift) {
    let mut lines: Vec<&str> = Vec::with_capacity(2);
    if req.is_preview {
        lines.push(&cfg.preview_directive);
    }
    // One line per prefix entry; the count drives the diagnostic shift.
    let skip = u32::try_from(lines.len()).unwrap_or(u32::MAX);
    lines.push(&req.source);
    let source = lines.join("\n");

    let mut arguments = vec![
        req.source_path.clone(),
        "-o".into(),
        cfg.render_output_path.clone(),
        "--export-format=binstl".into(),
    ];
    arguments.extend(define_args(&req.vars));
    arguments.extend(req.features.iter().map(|f| format!("--enable={f}")));
    arguments.extend(req.extra_args.iter().cloned());

    let job = JobRequest {
        input_files: vec![(req.source_path.clone(), source)],
        arguments,
        expected_output_paths: vec![cfg.render_output_path.clone()],
    };
    (job, LineShift::new(req.source_path.clone(), skip))
}

/// Turn a finished tool run into a priced artifact.
///
/// # Errors
///
/// - [`PipelineError::ToolReported`] when the tool reported an error; the
///   diagnostics parsed so far travel with the error.
/// - [`PipelineError::NoOutput`] when no artifact was written.
/// - [`PipelineError::OutputParse`] when the mesh cannot be parsed.
pub fn finish_render(
    log_parser: &dyn LogParser,
    mesh_parser: &dyn MeshParser,
    pricing_cfg: &PricingConfig,
    expected_output: &str,
    shift: &LineShift,
    result: JobResult,
) -> Result<RenderOutput, PipelineError> {
    let diagnostics = log_parser.parse(&result.merged_log, shift);

    if let Some(message) = result.tool_reported_error {
        return Err(PipelineError::ToolReported {
            message,
            diagnostics: Some(diagnostics),
        });
    }

    let Some((path, bytes)) = result.outputs.into_iter().next() else {
        return Err(PipelineError::NoOutput(expected_output.to_owned()));
    };
    let file_name = path
        .rfind('/')
        .map_or_else(|| path.clone(), |i| path[i + 1..].to_owned());

    let triangles = mesh_parser.parse(&bytes)?;
    let quote = pricing::quote(&triangles, pricing_cfg);
    debug!(
        weight = quote.weight,
        volume = quote.volume,
        duration = quote.print_duration,
        total_price = quote.total_price,
        "priced render output"
    );

    Ok(RenderOutput {
        artifact: Artifact::new(file_name, bytes),
        diagnostics,
        elapsed_millis: result.elapsed_millis,
        quote,
        currency: pricing_cfg.currency.clone(),
    })
}
