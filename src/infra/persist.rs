//! State persisters.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::{AppResult, StatePersister};
use crate::state::{AppState, SavedState};

/// In-memory persister keeping the most recent committed roots.
pub struct InMemoryStatePersister<S> {
    saved: Mutex<VecDeque<Arc<S>>>,
    max_saved: usize,
}

impl<S> InMemoryStatePersister<S> {
    /// Create a persister with a bounded buffer.
    #[must_use]
    pub fn new(max_saved: usize) -> Self {
        Self {
            saved: Mutex::new(VecDeque::with_capacity(max_saved)),
            max_saved: max_saved.max(1),
        }
    }

    /// Snapshot of stored roots, oldest first.
    pub fn saved(&self) -> Vec<Arc<S>> {
        self.saved.lock().iter().cloned().collect()
    }

    /// Most recently stored root.
    pub fn last(&self) -> Option<Arc<S>> {
        self.saved.lock().back().cloned()
    }

    /// Number of stored roots.
    pub fn len(&self) -> usize {
        self.saved.lock().len()
    }

    /// Whether nothing was stored yet.
    pub fn is_empty(&self) -> bool {
        self.saved.lock().is_empty()
    }
}

impl<S: Send + Sync + 'static> StatePersister<S> for InMemoryStatePersister<S> {
    fn save(&self, state: &Arc<S>) {
        let mut saved = self.saved.lock();
        if saved.len() >= self.max_saved {
            saved.pop_front();
        }
        saved.push_back(Arc::clone(state));
    }
}

/// Persister writing params and view preferences as JSON.
#[derive(Debug, Clone)]
pub struct JsonFilePersister {
    path: PathBuf,
}

impl JsonFilePersister {
    /// Persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a previously saved state, `None` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn load(&self) -> AppResult<Option<SavedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading saved state {}", self.path.display()))?;
        let saved = serde_json::from_str(&raw)
            .with_context(|| format!("parsing saved state {}", self.path.display()))?;
        Ok(Some(saved))
    }

    fn write(&self, saved: &SavedState) -> AppResult<()> {
        let json = serde_json::to_string_pretty(saved).context("serializing state")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing saved state {}", self.path.display()))
    }
}

impl StatePersister<AppState> for JsonFilePersister {
    fn save(&self, state: &Arc<AppState>) {
        match self.write(&state.saved()) {
            Ok(()) => debug!(path = %self.path.display(), "saved state"),
            Err(e) => warn!(path = %self.path.display(), "failed to save state: {e:#}"),
        }
    }
}
