//! luahost core
//!
//! This crate embeds Lua virtual machines inside a host application:
//! - A process-wide registry mapping VM handles back to their owning session
//! - Native bridge globals (`import`, `print`, `loadUI`) and the `error` handler
//! - A host module searcher spliced into `package.searchers`
//! - Sessions that own one VM and execute buffers, strings and files

pub mod bridge;
pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod registry;
pub mod searchers;
pub mod session;

pub use catalog::{ObjectHandle, TypeCatalog, TypeHandle, TypeKind};
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use host::{
    FileLoader, HostContext, HostLog, HostObject, LogBuffer, LogLevel, ObjectModel, TracingLog,
    UiClass,
};
pub use registry::{SessionHost, VmHandle};
pub use session::{ScriptValue, Session, SessionState};

/// Maximum length in bytes of a chunk name, including the leading `@`
pub const CHUNK_NAME_LIMIT: usize = 255;

/// Build the diagnostic chunk name `@<name>` for a logical file name.
///
/// Names that would exceed [`CHUNK_NAME_LIMIT`] bytes are cut at the last
/// character boundary that fits.
pub fn chunk_name(name: &str) -> String {
    let mut chunk = String::with_capacity(CHUNK_NAME_LIMIT.min(name.len() + 1));
    chunk.push('@');
    for ch in name.chars() {
        if chunk.len() + ch.len_utf8() > CHUNK_NAME_LIMIT {
            break;
        }
        chunk.push(ch);
    }
    chunk
}
