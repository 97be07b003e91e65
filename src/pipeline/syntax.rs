//! Syntax-check pipeline: fast diagnostics plus the parameter manifest.

use serde::{Deserialize, Serialize};
use tracing::error;

use super::vars::ParameterSet;
use crate::config::PipelineConfig;
use crate::core::{Diagnostics, JobRequest, JobResult, LineShift, LogParser, PipelineError};

/// Lines the syntax check prepends to the user's source.
pub const SYNTAX_PREFIX_LINES: u32 = 1;

/// Input of one syntax check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxCheckRequest {
    /// User source text.
    pub source: String,
    /// Virtual path the source is compiled from.
    pub source_path: String,
}

/// Outcome of a successful syntax check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxCheckOutput {
    /// Line-shifted diagnostics.
    pub diagnostics: Diagnostics,
    /// Parameter manifest, absent when the tool wrote none or it was malformed.
    pub parameter_set: Option<ParameterSet>,
}

/// Build the tool invocation for a syntax check.
#[must_use]
pub fn syntax_job_request(cfg: &PipelineConfig, req: &SyntaxCheckRequest) -> JobRequest {
    let source = format!("{}\n{}\n", cfg.preview_directive, req.source);
    JobRequest {
        input_files: vec![(req.source_path.clone(), source)],
        arguments: vec![
            req.source_path.clone(),
            "-o".into(),
            cfg.syntax_output_path.clone(),
            "--export-format=param".into(),
        ],
        expected_output_paths: vec![cfg.syntax_output_path.clone()],
    }
}

/// Turn a finished tool run into diagnostics and a manifest.
///
/// A missing or malformed manifest is logged and reported as absent; the
/// diagnostics are returned either way.
///
/// # Errors
///
/// Currently infallible once the job has finished; the `Result` matches the
/// other pipeline stages.
pub fn finish_syntax_check(
    log_parser: &dyn LogParser,
    req: &SyntaxCheckRequest,
    result: &JobResult,
) -> Result<SyntaxCheckOutput, PipelineError> {
    let shift = LineShift::new(req.source_path.clone(), SYNTAX_PREFIX_LINES);
    let diagnostics = log_parser.parse(&result.merged_log, &shift);

    let parameter_set = match result.outputs.as_slice() {
        [(_, content)] => match ParameterSet::from_json_slice(content) {
            Ok(set) => Some(set),
            Err(e) => {
                error!(
                    path = %req.source_path,
                    content = %String::from_utf8_lossy(content),
                    "Error while parsing parameter set: {e}"
                );
                None
            }
        },
        outputs => {
            error!(path = %req.source_path, outputs = outputs.len(), "No output from runner!");
            None
        }
    };

    Ok(SyntaxCheckOutput {
        diagnostics,
        parameter_set,
    })
}
