//! Loading files from search-path directories

use crate::{LoaderConfig, LoaderError, Result};
use luahost_core::FileLoader;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

/// Resolves names against a list of directories
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    config: LoaderConfig,
}

impl DirectoryLoader {
    /// Create a loader over `config.search_paths`
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// The configuration this loader was built from
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read the file `name` refers to
    pub fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        let bytes = fs::read(&path).map_err(|error| LoaderError::Io {
            path: path.clone(),
            error,
        })?;
        debug!("Loaded {} from {:?} ({} bytes)", name, path, bytes.len());
        Ok(bytes)
    }

    /// Find the canonical path of the file `name` refers to.
    ///
    /// A name ending in the configured extension is taken as a relative file
    /// path. Any other name is a module name whose dots separate directories:
    /// `a.b` tries `a/b.lua`, then `a/b/init.lua`, in each search path.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;

        let candidates = self.candidates(name);
        for search_path in &self.config.search_paths {
            for candidate in &candidates {
                let path = search_path.join(candidate);
                if path.is_file() {
                    trace!("Found {} at {:?}", name, path);
                    return self.validate_resolved_path(path);
                }
            }
        }

        Err(LoaderError::NotFound {
            name: name.to_string(),
        })
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let extension = &self.config.extension;
        let suffix = format!(".{}", extension);
        if name.ends_with(&suffix) {
            return vec![PathBuf::from(name)];
        }

        let base: PathBuf = name.split('.').collect();
        vec![
            base.with_extension(extension),
            base.join(format!("init.{}", extension)),
        ]
    }

    /// Ensure a resolved path stays within one of the search paths
    fn validate_resolved_path(&self, path: PathBuf) -> Result<PathBuf> {
        let canonical_path = path.canonicalize().map_err(|error| LoaderError::Io {
            path: path.clone(),
            error,
        })?;

        let contained = self.config.search_paths.iter().any(|search_path| {
            search_path
                .canonicalize()
                .map(|canonical_search| canonical_path.starts_with(canonical_search))
                .unwrap_or(false)
        });

        if !contained {
            warn!("Module path {:?} is outside allowed search paths", canonical_path);
            return Err(LoaderError::OutsideSearchPath {
                path: canonical_path,
            });
        }

        Ok(canonical_path)
    }
}

/// Reject names that could escape the search paths
fn validate_name(name: &str) -> Result<()> {
    let invalid = || LoaderError::InvalidName {
        name: name.to_string(),
    };

    if name.is_empty() {
        return Err(invalid());
    }

    if name.contains('\0') {
        warn!("Rejected module name with null byte: {:?}", name);
        return Err(invalid());
    }

    if name.split(['/', '\\']).any(|segment| segment == "..") {
        warn!("Rejected module name with directory traversal: {}", name);
        return Err(invalid());
    }

    let path = Path::new(name);
    let rooted = path
        .components()
        .any(|component| matches!(component, Component::Prefix(_) | Component::RootDir));
    if path.is_absolute() || rooted {
        warn!("Rejected absolute module name: {}", name);
        return Err(invalid());
    }

    Ok(())
}

impl FileLoader for DirectoryLoader {
    fn load_file(&self, name: &str) -> Option<Vec<u8>> {
        match self.load(name) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                debug!("{}", err);
                None
            }
        }
    }
}
