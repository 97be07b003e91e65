//! Collaborator interfaces the pipelines and orchestrator call into.
//!
//! Implementations live in [`crate::infra`]; hosts may supply their own.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::diagnostics::{Diagnostics, LineShift};
use super::job::LogEntry;
use super::PipelineError;

/// Three vertices of one mesh triangle.
pub type Triangle = [[f64; 3]; 3];

/// Converts raw tool log lines into structured, line-shifted diagnostics.
pub trait LogParser: Send + Sync + 'static {
    /// Parse `log`, mapping line numbers in `shift.source_path` back by `shift.skip_lines`.
    fn parse(&self, log: &[LogEntry], shift: &LineShift) -> Diagnostics;
}

/// Parses the binary geometry artifact into triangles.
pub trait MeshParser: Send + Sync + 'static {
    /// Parse mesh bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::OutputParse`] when the bytes are malformed.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Triangle>, PipelineError>;
}

/// Virtual filesystem shared with the external tool.
pub trait VirtualFs: Send + Sync + 'static {
    /// Write `content` to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure.
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), String>;

    /// Read the content of `path`.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure, e.g. when the file is missing.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, String>;
}

/// Fire-and-forget persistence of committed state.
pub trait StatePersister<S>: Send + Sync + 'static {
    /// Save a committed root. Failures are the persister's concern.
    fn save(&self, state: &Arc<S>);
}

/// Receives the one-shot notification that a full render finished.
pub trait CompletionNotifier: Send + Sync + 'static {
    /// Called once per successful non-preview render.
    fn render_completed(&self);
}

/// Binary artifact produced by a successful render.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File name, without directories.
    pub file_name: String,
    /// Artifact content.
    pub bytes: Arc<Vec<u8>>,
}

impl Artifact {
    /// Create an artifact.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the artifact is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Live handle to an artifact, e.g. a URL the viewer loads it from.
///
/// Single owner: whoever replaces it must release it exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactHandle(pub String);

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from releasing or resolving artifact handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// The handle was never issued by this registry.
    #[error("unknown artifact handle: {0}")]
    UnknownHandle(ArtifactHandle),
    /// The handle was already released.
    #[error("artifact handle already released: {0}")]
    AlreadyReleased(ArtifactHandle),
}

/// Issues and revokes live artifact handles.
pub trait HandleRegistry: Send + Sync + 'static {
    /// Issue a new handle for `artifact`.
    fn issue(&self, artifact: &Artifact) -> ArtifactHandle;

    /// Release `handle`.
    ///
    /// # Errors
    ///
    /// Fails on double release or on a handle this registry never issued.
    fn release(&self, handle: &ArtifactHandle) -> Result<(), HandleError>;
}
