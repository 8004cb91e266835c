//! Loader error types

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for loader results
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while locating or reading a file
#[derive(Error, Debug)]
pub enum LoaderError {
    /// No search path holds the requested name
    #[error("Module not found: {name}")]
    NotFound {
        /// The requested name
        name: String,
    },

    /// The name is empty, absolute, or otherwise unsafe
    #[error("Invalid module name: {name:?}")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// The name resolved to a file outside every search path
    #[error("Module path {path:?} is outside the search paths")]
    OutsideSearchPath {
        /// Canonical path of the resolved file
        path: PathBuf,
    },

    /// Reading the file failed
    #[error("IO error reading module {path:?}: {error}")]
    Io {
        /// Path of the file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        error: std::io::Error,
    },
}
