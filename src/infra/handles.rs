//! In-memory artifact handle registry.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::{Artifact, ArtifactHandle, HandleError, HandleRegistry};

#[derive(Debug)]
struct Entry {
    artifact: Artifact,
    released: bool,
}

/// [`HandleRegistry`] that keeps issued artifacts in memory.
///
/// Released handles stay known so double release and use-after-release
/// are reported instead of silently ignored.
#[derive(Debug, Default)]
pub struct InMemoryHandleRegistry {
    entries: Mutex<HashMap<ArtifactHandle, Entry>>,
}

impl InMemoryHandleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifact behind a live handle.
    ///
    /// # Errors
    ///
    /// Fails for unknown or already released handles.
    pub fn resolve(&self, handle: &ArtifactHandle) -> Result<Artifact, HandleError> {
        match self.entries.lock().get(handle) {
            Some(entry) if entry.released => Err(HandleError::AlreadyReleased(handle.clone())),
            Some(entry) => Ok(entry.artifact.clone()),
            None => Err(HandleError::UnknownHandle(handle.clone())),
        }
    }

    /// Whether `handle` was issued and not yet released.
    pub fn is_live(&self, handle: &ArtifactHandle) -> bool {
        self.entries
            .lock()
            .get(handle)
            .is_some_and(|entry| !entry.released)
    }

    /// Number of handles that are still live.
    pub fn live_count(&self) -> usize {
        self.entries.lock().values().filter(|e| !e.released).count()
    }

    /// Number of handles issued so far.
    pub fn issued_count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl HandleRegistry for InMemoryHandleRegistry {
    fn issue(&self, artifact: &Artifact) -> ArtifactHandle {
        let handle = ArtifactHandle(format!("artifact:{}", uuid::Uuid::new_v4()));
        debug!(%handle, file = %artifact.file_name, "issued artifact handle");
        self.entries.lock().insert(
            handle.clone(),
            Entry {
                artifact: artifact.clone(),
                released: false,
            },
        );
        handle
    }

    fn release(&self, handle: &ArtifactHandle) -> Result<(), HandleError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(handle)
            .ok_or_else(|| HandleError::UnknownHandle(handle.clone()))?;
        if entry.released {
            return Err(HandleError::AlreadyReleased(handle.clone()));
        }
        entry.released = true;
        debug!(%handle, "released artifact handle");
        Ok(())
    }
}
