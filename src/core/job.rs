//! Boundary to the external compiler.
//!
//! The scheduler never spawns processes itself. A [`JobRunner`] turns a
//! [`JobRequest`] into a running [`JobHandle`]; the handle can be awaited for
//! its [`JobResult`] or killed when the request is superseded.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Which stream a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// One line of the tool's merged stdout/stderr log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Originating stream.
    pub stream: LogStream,
    /// Line text without the trailing newline.
    pub text: String,
}

impl LogEntry {
    /// Line written to stderr.
    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: LogStream::Stderr,
            text: text.into(),
        }
    }

    /// Line written to stdout.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: LogStream::Stdout,
            text: text.into(),
        }
    }
}

/// Inputs for one external tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRequest {
    /// Files written into the tool's filesystem before it starts, as `(path, content)`.
    pub input_files: Vec<(String, String)>,
    /// Command-line arguments.
    pub arguments: Vec<String>,
    /// Paths the tool is expected to write; they are read back after it exits.
    pub expected_output_paths: Vec<String>,
}

/// Everything a finished tool run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobResult {
    /// Merged stdout/stderr in emission order.
    pub merged_log: Vec<LogEntry>,
    /// Output files that exist after the run, as `(path, bytes)`.
    pub outputs: Vec<(String, Vec<u8>)>,
    /// Wall-clock duration of the run.
    pub elapsed_millis: u64,
    /// Error the tool reported, if it reported one.
    pub tool_reported_error: Option<String>,
}

/// A running external job.
///
/// `wait` may be polled while `kill` is called from another flow; a killed
/// job resolves `wait` with an error promptly.
#[async_trait]
pub trait JobHandle: Send + Sync {
    /// Wait for the job to finish.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ToolInvocation`] when the process could not
    /// run, crashed, or was killed.
    async fn wait(&self) -> Result<JobResult, PipelineError>;

    /// Terminate the underlying process. Must be idempotent.
    fn kill(&self);
}

/// Capability to start external compiler jobs.
pub trait JobRunner: Send + Sync + 'static {
    /// Start a job. Starting is synchronous; completion is observed through the handle.
    fn run_job(&self, request: JobRequest) -> Arc<dyn JobHandle>;
}
