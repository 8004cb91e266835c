//! Session error types

use crate::registry::VmHandle;
use thiserror::Error;

/// Type alias for session results
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by sessions and their bridge callbacks
#[derive(Error, Debug)]
pub enum SessionError {
    /// `init` was called without a host context
    #[error("A host context is required to initialize a session")]
    MissingContext,

    /// The session has no live VM
    #[error("Session is not initialized")]
    NotInitialized,

    /// The file loader is missing or had nothing for this name
    #[error("Can't load file {name}")]
    FileUnavailable {
        /// Logical file name that was requested
        name: String,
    },

    /// The buffer did not compile
    #[error("Failed to compile {chunk}: {message}")]
    Compile {
        /// Chunk name the buffer was compiled under
        chunk: String,
        /// Compiler diagnostic
        message: String,
    },

    /// The chunk raised an error while running
    #[error("Runtime error in {chunk}: {message}")]
    Runtime {
        /// Chunk name of the running buffer
        chunk: String,
        /// Message produced by the error handler
        message: String,
    },

    /// A bridge callback ran for a handle with no registered session
    #[error("VM handle {0} has no owning session")]
    Orphaned(VmHandle),

    /// A configured standard library name is unknown
    #[error("Unknown standard library: {0}")]
    UnknownLibrary(String),

    /// Error reported by the embedded VM itself
    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

impl SessionError {
    /// Convert into an error that can be raised inside the VM
    pub fn into_lua(self) -> mlua::Error {
        match self {
            SessionError::Lua(err) => err,
            other => mlua::Error::external(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
