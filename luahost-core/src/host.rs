//! Capabilities a session consumes from its host
//!
//! The host supplies file bytes, an object model for `import`/`loadUI`, and a
//! log sink. Each is a trait so embedders can plug in their own systems.

use mlua::{Lua, Value};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque host state handed to `init` and used when constructing UI objects
pub type HostContext = Arc<dyn Any + Send + Sync>;

/// Supplies the bytes of logical files for `execute_file` and `require`
pub trait FileLoader: Send + Sync {
    /// Return the full contents of `name`, or `None` if it is unavailable
    fn load_file(&self, name: &str) -> Option<Vec<u8>>;
}

impl<F> FileLoader for F
where
    F: Fn(&str) -> Option<Vec<u8>> + Send + Sync,
{
    fn load_file(&self, name: &str) -> Option<Vec<u8>> {
        self(name)
    }
}

/// A UI class resolved by the object model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiClass {
    reference: String,
}

impl UiClass {
    /// Create a UI class for a resolved reference such as `Blueprint'Menu_C'`
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// The reference this class was resolved from
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// An object created by the host and pushed into a VM
#[derive(Clone)]
pub struct HostObject {
    class_name: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Wrap a host value together with the name of its class
    pub fn new(class_name: impl Into<String>, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            class_name: class_name.into(),
            payload,
        }
    }

    /// Name of the class this object was created from
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Borrow the payload as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

/// Marshalling layer between host types and VM values
pub trait ObjectModel: Send + Sync {
    /// Push a handle for the class named `name`, if it exists
    fn push_class<'lua>(&self, lua: &'lua Lua, name: &str) -> mlua::Result<Option<Value<'lua>>>;

    /// Push a handle for the struct named `name`, if it exists
    fn push_struct<'lua>(&self, lua: &'lua Lua, name: &str)
        -> mlua::Result<Option<Value<'lua>>>;

    /// Resolve a UI class reference
    fn load_ui_class(&self, reference: &str) -> Option<UiClass>;

    /// Construct a UI object of `class` in `context`
    fn create_ui(&self, context: &HostContext, class: &UiClass) -> Option<HostObject>;

    /// Push a host object into the VM
    fn push_object<'lua>(&self, lua: &'lua Lua, object: HostObject) -> mlua::Result<Value<'lua>>;

    /// Install any globals or metatables the model needs in a fresh VM
    fn init_types(&self, _lua: &Lua) -> mlua::Result<()> {
        Ok(())
    }
}

/// Destination for script output and diagnostics
pub trait HostLog: Send + Sync {
    /// Informational output, such as `print`
    fn info(&self, message: &str);

    /// Errors: compile failures, runtime failures, missing files
    fn error(&self, message: &str);
}

/// Forwards messages to `tracing` under the `luahost` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl HostLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!(target: "luahost", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "luahost", "{}", message);
    }
}

/// Log levels recorded by [`LogBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Error,
}

/// Records messages in memory, for hosts that display them later
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl LogBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages in order
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Recorded info messages
    pub fn infos(&self) -> Vec<String> {
        self.messages(LogLevel::Info)
    }

    /// Recorded error messages
    pub fn errors(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl HostLog for LogBuffer {
    fn info(&self, message: &str) {
        self.entries.lock().push((LogLevel::Info, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.entries.lock().push((LogLevel::Error, message.to_string()));
    }
}
