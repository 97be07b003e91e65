//! Error types for scheduler and pipeline operations.

use thiserror::Error;

use super::diagnostics::Diagnostics;

/// Errors produced while constructing scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No tokio runtime was available to drive timers and watchers.
    #[error("no runtime available: {0}")]
    NoRuntime(String),
}

/// Failure of a single pipeline run.
///
/// `Superseded` and `Cancelled` are produced by the scheduler itself and are
/// never surfaced to users; see [`PipelineError::is_silent`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The external tool could not be started or crashed.
    #[error("tool invocation failed: {0}")]
    ToolInvocation(String),
    /// The tool ran and reported an error. Diagnostics collected before the
    /// failure are carried along so callers can still show them.
    #[error("{message}")]
    ToolReported {
        /// Error text reported by the tool.
        message: String,
        /// Diagnostics parsed from the log, if any.
        diagnostics: Option<Diagnostics>,
    },
    /// The tool finished cleanly but the expected output file is missing.
    #[error("no output from runner: expected {0}")]
    NoOutput(String),
    /// Artifact or manifest bytes were malformed.
    #[error("failed to parse output: {0}")]
    OutputParse(String),
    /// A newer call replaced this one before it could settle.
    #[error("superseded by a newer request")]
    Superseded,
    /// The task was cancelled by its owner.
    #[error("cancelled")]
    Cancelled,
    /// The executor dropped its settler without resolving or rejecting.
    #[error("task abandoned without an outcome")]
    Abandoned,
}

impl PipelineError {
    /// Whether this failure must be dropped silently instead of shown.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Superseded | Self::Cancelled)
    }

    /// Diagnostics attached to a tool-reported failure.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::ToolReported { diagnostics, .. } => diagnostics.as_ref(),
            _ => None,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
