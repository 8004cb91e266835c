//! luahost module loading
//!
//! File loaders a [`luahost_core::Session`] can use for `execute_file` and
//! `require`:
//! - Search-path directories with dotted module names
//! - In-memory tables for embedded or generated sources
//! - An LRU cache in front of any other loader

pub mod cache;
pub mod directory;
pub mod error;
pub mod memory;

pub use cache::CachingLoader;
pub use directory::DirectoryLoader;
pub use error::{LoaderError, Result};
pub use memory::MemoryLoader;

use luahost_core::FileLoader;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Module loading configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directories searched in order
    pub search_paths: Vec<PathBuf>,

    /// Extension appended to module names
    pub extension: String,

    /// Whether to keep loaded bytes in memory
    pub enable_cache: bool,

    /// Maximum number of cached files; zero means unbounded
    pub max_cache_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from("."), PathBuf::from("./scripts")],
            extension: "lua".to_string(),
            enable_cache: true,
            max_cache_size: 256,
        }
    }
}

/// Build the loader described by `config`
pub fn from_config(config: LoaderConfig) -> Arc<dyn FileLoader> {
    let enable_cache = config.enable_cache;
    let max_cache_size = config.max_cache_size;
    let directory = DirectoryLoader::new(config);
    if enable_cache {
        Arc::new(CachingLoader::new(directory, max_cache_size))
    } else {
        Arc::new(directory)
    }
}
