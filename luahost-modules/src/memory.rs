//! In-memory file table

use luahost_core::FileLoader;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

/// Serves files from a name → bytes table
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, returning the loader for chaining
    pub fn with_file(self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(name, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.write().insert(name.into(), contents.into());
    }

    /// Remove a file, returning its contents
    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.files.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl FileLoader for MemoryLoader {
    fn load_file(&self, name: &str) -> Option<Vec<u8>> {
        let bytes = self.files.read().get(name).cloned();
        trace!("Memory lookup for {}: {}", name, bytes.is_some());
        bytes
    }
}
