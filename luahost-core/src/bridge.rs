//! Native functions exposed to scripts
//!
//! `import`, `print` and `loadUI` are installed as globals. The `error`
//! function is the message handler of every protected call a session makes.
//! Each closure captures only the [`VmHandle`] of its VM and goes through the
//! registry to reach the owning session.

use crate::error::SessionError;
use crate::registry::{self, SessionHost, VmHandle};
use mlua::{Function, Lua, MultiValue, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Global name of the type lookup function
pub const IMPORT: &str = "import";
/// Global name of the logging print function
pub const PRINT: &str = "print";
/// Name of the protected-call error handler
pub const ERROR: &str = "error";
/// Global name of the UI constructor
pub const LOAD_UI: &str = "loadUI";

/// Registry key of the `tostring` captured when the bridge was installed
pub(crate) const TOSTRING_KEY: &str = "luahost.tostring";
/// Registry key of the `xpcall` captured when the bridge was installed
pub(crate) const XPCALL_KEY: &str = "luahost.xpcall";

/// Install the bridge globals into `lua` on behalf of `handle`
pub fn install(lua: &Lua, handle: VmHandle) -> mlua::Result<()> {
    let globals = lua.globals();

    // Keep the VM's own conversions even if a script replaces the globals
    lua.set_named_registry_value(TOSTRING_KEY, globals.get::<_, Function>("tostring")?)?;
    lua.set_named_registry_value(XPCALL_KEY, globals.get::<_, Function>("xpcall")?)?;

    globals.set(
        IMPORT,
        lua.create_function(move |lua, name: String| import(lua, handle, &name))?,
    )?;
    globals.set(
        PRINT,
        lua.create_function(move |lua, args: MultiValue| print(lua, handle, args))?,
    )?;
    globals.set(
        LOAD_UI,
        lua.create_function(move |lua, name: String| load_ui(lua, handle, &name))?,
    )?;

    debug!("Installed bridge functions for VM {}", handle);
    Ok(())
}

/// The message handler of one protected call
pub struct ErrorHandler<'lua> {
    function: Function<'lua>,
    reported: Arc<AtomicBool>,
}

impl<'lua> ErrorHandler<'lua> {
    /// The function to pass to `xpcall`
    pub fn function(&self) -> &Function<'lua> {
        &self.function
    }

    /// Whether the handler has run and logged a failure.
    ///
    /// Lua skips the handler for memory errors, so a failed call may still
    /// need reporting.
    pub fn reported(&self) -> bool {
        self.reported.load(Ordering::Acquire)
    }
}

/// Create the error handler for one protected call
pub fn error_handler(lua: &Lua, handle: VmHandle) -> mlua::Result<ErrorHandler<'_>> {
    let reported = Arc::new(AtomicBool::new(false));
    let flag = reported.clone();
    let function = lua.create_function(move |lua, message: Value| {
        flag.store(true, Ordering::Release);
        report_error(lua, handle, message)
    })?;
    Ok(ErrorHandler { function, reported })
}

/// The UI class reference `loadUI(name)` resolves
pub fn ui_class_reference(name: &str) -> String {
    format!("Blueprint'{}_C'", name)
}

/// Recover the session that owns `handle`.
///
/// A bridge function can only run inside a live VM, so a missing entry means
/// the registry and the VM disagree.
pub(crate) fn owner(handle: VmHandle) -> mlua::Result<Arc<SessionHost>> {
    registry::lookup(handle).ok_or_else(|| {
        error!("Bridge callback for VM {} found no owning session", handle);
        SessionError::Orphaned(handle).into_lua()
    })
}

/// Convert a value with the VM's `tostring`.
///
/// Returns `None` when the conversion raises or does not produce a string.
pub(crate) fn display_string(lua: &Lua, value: Value) -> Option<String> {
    if let Value::Error(err) = &value {
        return Some(err.to_string());
    }
    let tostring: Function = lua.named_registry_value(TOSTRING_KEY).ok()?;
    match tostring.call::<_, Value>(value).ok()? {
        Value::String(s) => Some(s.to_string_lossy().into_owned()),
        _ => None,
    }
}

fn import<'lua>(lua: &'lua Lua, handle: VmHandle, name: &str) -> mlua::Result<Value<'lua>> {
    let host = owner(handle)?;
    let model = host.object_model();

    if let Some(class) = model.push_class(lua, name)? {
        return Ok(class);
    }
    if let Some(structure) = model.push_struct(lua, name)? {
        return Ok(structure);
    }
    Err(mlua::Error::RuntimeError(format!(
        "Can't find class named {}",
        name
    )))
}

fn print(lua: &Lua, handle: VmHandle, args: MultiValue) -> mlua::Result<()> {
    let host = owner(handle)?;
    host.log_info(&format_print_args(lua, args));
    Ok(())
}

/// Join arguments as `\t<arg>` for each argument
pub(crate) fn format_print_args(lua: &Lua, args: MultiValue) -> String {
    let mut line = String::new();
    for value in args {
        line.push('\t');
        if let Some(text) = display_string(lua, value) {
            line.push_str(&text);
        }
    }
    line
}

fn report_error(lua: &Lua, handle: VmHandle, message: Value) -> mlua::Result<String> {
    let text = display_string(lua, message)
        .unwrap_or_else(|| "(error object is not a string)".to_string());
    match registry::lookup(handle) {
        Some(host) => host.log_error(&text),
        // Raising from a message handler would replace the original error
        None => error!("VM {} has no owning session: {}", handle, text),
    }
    Ok(text)
}

fn load_ui<'lua>(lua: &'lua Lua, handle: VmHandle, name: &str) -> mlua::Result<Value<'lua>> {
    let host = owner(handle)?;
    let model = host.object_model();

    let reference = ui_class_reference(name);
    let Some(class) = model.load_ui_class(&reference) else {
        return Err(mlua::Error::RuntimeError(format!(
            "Can't find ui named {}",
            name
        )));
    };

    let context = host
        .context()
        .ok_or_else(|| SessionError::NotInitialized.into_lua())?;
    match model.create_ui(&context, &class) {
        Some(object) => model.push_object(lua, object),
        None => Ok(Value::Nil),
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
