//! Host module searcher for `require`
//!
//! The searcher is inserted at position 2 of `package.searchers`: after the
//! preload searcher, so modules already registered there short-circuit, and
//! before the file-system searchers, so the host's files take precedence.

use crate::bridge::owner;
use crate::chunk_name;
use crate::registry::VmHandle;
use mlua::{Function, Lua, Table, Value};
use tracing::{debug, trace};

/// 1-based position of the host searcher in `package.searchers`
pub const SEARCHER_SLOT: usize = 2;

/// Insert `item` at [`SEARCHER_SLOT`], shifting later entries one slot down.
///
/// A chain shorter than one entry receives the item at its end.
pub fn splice<T>(chain: &mut Vec<T>, item: T) {
    let index = (SEARCHER_SLOT - 1).min(chain.len());
    chain.insert(index, item);
}

/// Splice `searcher` into a Lua sequence table
pub fn splice_table<'lua>(searchers: &Table<'lua>, searcher: Value<'lua>) -> mlua::Result<()> {
    let mut chain = searchers
        .clone()
        .sequence_values::<Value>()
        .collect::<mlua::Result<Vec<_>>>()?;
    splice(&mut chain, searcher);
    for (index, entry) in chain.into_iter().enumerate() {
        searchers.raw_set(index as mlua::Integer + 1, entry)?;
    }
    Ok(())
}

/// Install the host searcher for `handle` into `package.searchers`
pub fn install(lua: &Lua, handle: VmHandle) -> mlua::Result<()> {
    let searcher = lua.create_function(move |lua, name: String| resolve(lua, handle, &name))?;
    let package: Table = lua.globals().get("package")?;
    let searchers: Table = package.get("searchers")?;
    splice_table(&searchers, Value::Function(searcher))?;
    debug!("Installed host searcher for VM {}", handle);
    Ok(())
}

/// Resolve `name` through the owning session's file loader.
///
/// Returns the compiled chunk, or nothing when the loader has no bytes or the
/// bytes do not compile; both cases are logged and later searchers still run.
pub fn resolve<'lua>(
    lua: &'lua Lua,
    handle: VmHandle,
    name: &str,
) -> mlua::Result<Option<Function<'lua>>> {
    let host = owner(handle)?;
    let Some(bytes) = host.read_file(name) else {
        return Ok(None);
    };

    let chunk = chunk_name(name);
    match lua.load(&bytes[..]).set_name(chunk.as_str()).into_function() {
        Ok(function) => {
            trace!("Resolved module {} as {}", name, chunk);
            Ok(Some(function))
        }
        Err(err) => {
            host.log_error(&compile_message(&err));
            Ok(None)
        }
    }
}

/// The compiler's own diagnostic for a failed load
pub(crate) fn compile_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "searchers_tests.rs"]
mod tests;
