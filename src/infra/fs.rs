//! In-memory virtual filesystem.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::core::VirtualFs;

/// [`VirtualFs`] backed by a map from path to content.
#[derive(Debug, Default)]
pub struct InMemoryFs {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFs {
    /// Create an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` exists.
    pub fn exists(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    /// Content of `path` as UTF-8, lossily decoded.
    pub fn read_to_string(&self, path: &str) -> Option<String> {
        self.files
            .read()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl VirtualFs for InMemoryFs {
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), String> {
        if path.is_empty() {
            return Err("cannot write to an empty path".into());
        }
        self.files.write().insert(path.to_owned(), content.to_vec());
        Ok(())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, String> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such file: {path}"))
    }
}
