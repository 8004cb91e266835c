//! Sessions: one host-side owner per Lua VM
//!
//! A session moves through `Uninitialized → Initialized ⇄ Closed`. While it
//! is initialized its VM handle is registered, the bridge globals are
//! installed and the host searcher sits in `package.searchers`.
//!
//! # Example
//!
//! ```rust,ignore
//! use luahost_core::{Session, SessionConfig};
//! use std::sync::Arc;
//!
//! let mut session = Session::new(SessionConfig::default())
//!     .with_file_loader(Arc::new(|name: &str| std::fs::read(name).ok()));
//! session.init(Some(Arc::new(())))?;
//! session.execute_file("main.lua");
//! session.close();
//! ```

use crate::bridge::{self, XPCALL_KEY};
use crate::catalog::TypeCatalog;
use crate::chunk_name;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::host::{FileLoader, HostContext, HostLog, ObjectModel, TracingLog};
use crate::registry::{self, SessionHost, VmHandle};
use crate::searchers::{self, compile_message};
use mlua::{DeserializeOptions, Function, Lua, LuaOptions, LuaSerdeExt, MultiValue, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Host-side form of a value produced by a script
pub type ScriptValue = serde_json::Value;

/// Lifecycle state of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Closed,
}

struct Vm {
    handle: VmHandle,
    lua: Lua,
}

/// Owns one Lua VM and the host services its callbacks reach
pub struct Session {
    config: SessionConfig,
    host: Arc<SessionHost>,
    vm: Option<Vm>,
    state: SessionState,
}

impl Session {
    /// Create an uninitialized session with an empty type catalog and
    /// `tracing` output
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            host: Arc::new(SessionHost::new(
                Arc::new(TypeCatalog::new()),
                Arc::new(TracingLog),
            )),
            vm: None,
            state: SessionState::Uninitialized,
        }
    }

    /// Use `loader` for `execute_file` and `require`
    pub fn with_file_loader(self, loader: Arc<dyn FileLoader>) -> Self {
        self.host.set_file_loader(Some(loader));
        self
    }

    /// Use `model` for `import` and `loadUI`
    pub fn with_object_model(self, model: Arc<dyn ObjectModel>) -> Self {
        self.host.set_object_model(model);
        self
    }

    /// Send `print` output and diagnostics to `log`
    pub fn with_log(self, log: Arc<dyn HostLog>) -> Self {
        self.host.set_log(log);
        self
    }

    /// Replace or remove the file loader
    pub fn set_file_loader(&self, loader: Option<Arc<dyn FileLoader>>) {
        self.host.set_file_loader(loader);
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle of the live VM, if any
    pub fn handle(&self) -> Option<VmHandle> {
        self.vm.as_ref().map(|vm| vm.handle)
    }

    /// The configuration new VMs are created with
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create a fresh VM bound to `context`.
    ///
    /// Fails without side effects when `context` is `None`. An already
    /// initialized session is closed first, so its old handle never outlives
    /// its VM.
    pub fn init(&mut self, context: Option<HostContext>) -> Result<VmHandle> {
        let context = context.ok_or(SessionError::MissingContext)?;
        let libs = self.config.std_libs()?;

        if self.vm.is_some() {
            debug!("Re-initializing session; closing previous VM first");
            self.close();
        }

        let lua = Lua::new_with(libs, LuaOptions::new())?;
        if let Some(limit) = self.config.memory_limit {
            lua.set_memory_limit(limit)?;
        }

        let handle = VmHandle::next();
        registry::register(handle, &self.host);
        self.host.set_context(Some(context));

        if let Err(err) = self.prepare(&lua, handle) {
            registry::unregister(handle);
            self.host.set_context(None);
            return Err(err.into());
        }

        self.vm = Some(Vm { handle, lua });
        self.state = SessionState::Initialized;
        info!("Initialized VM {}", handle);
        Ok(handle)
    }

    fn prepare(&self, lua: &Lua, handle: VmHandle) -> mlua::Result<()> {
        bridge::install(lua, handle)?;
        searchers::install(lua, handle)?;
        self.host.object_model().init_types(lua)
    }

    /// Tear down the VM. Safe to call any number of times.
    pub fn close(&mut self) {
        let Some(vm) = self.vm.take() else {
            return;
        };
        registry::unregister(vm.handle);
        drop(vm.lua);
        self.host.set_context(None);
        self.state = SessionState::Closed;
        info!("Closed VM {}", vm.handle);
    }

    /// Compile and run `buffer` under the chunk name `source_name`.
    ///
    /// Every failure is reported through the session's log. Values produced
    /// by the chunk are discarded, so the result is always `None`; use
    /// [`Session::evaluate`] to receive them.
    pub fn execute(&self, buffer: &[u8], source_name: &str) -> Option<ScriptValue> {
        let Some(vm) = self.live_vm() else {
            return None;
        };
        // Failures have been logged already
        let _ = self.protected_call(vm, buffer, source_name);
        None
    }

    /// Run a source string, using the string itself as its chunk name
    pub fn execute_string(&self, source: &str) -> Option<ScriptValue> {
        self.execute(source.as_bytes(), source)
    }

    /// Load `path` through the file loader and run it as `@<path>`
    pub fn execute_file(&self, path: &str) -> Option<ScriptValue> {
        let buffer = self.host.read_file(path)?;
        self.execute(&buffer, &chunk_name(path))
    }

    /// Like [`Session::execute`], but return the produced values or the failure.
    ///
    /// Functions, threads and userdata come back as `null`.
    pub fn evaluate(&self, buffer: &[u8], source_name: &str) -> Result<Vec<ScriptValue>> {
        let vm = self.live_vm().ok_or(SessionError::NotInitialized)?;
        let values = self.protected_call(vm, buffer, source_name)?;
        values
            .into_iter()
            .map(|value| {
                let options = DeserializeOptions::new().deny_unsupported_types(false);
                vm.lua
                    .from_value_with::<ScriptValue>(value, options)
                    .map_err(SessionError::from)
            })
            .collect()
    }

    /// Like [`Session::execute_file`], but return the produced values or the failure
    pub fn evaluate_file(&self, path: &str) -> Result<Vec<ScriptValue>> {
        self.live_vm().ok_or(SessionError::NotInitialized)?;
        let buffer = self
            .host
            .read_file(path)
            .ok_or_else(|| SessionError::FileUnavailable {
                name: path.to_string(),
            })?;
        self.evaluate(&buffer, &chunk_name(path))
    }

    fn live_vm(&self) -> Option<&Vm> {
        if self.vm.is_none() {
            self.host.log_error("Session is not initialized");
        }
        self.vm.as_ref()
    }

    /// Compile `buffer`, then call it through `xpcall` with a fresh `error`
    /// handler. Every runtime failure is logged exactly once.
    fn protected_call<'lua>(
        &self,
        vm: &'lua Vm,
        buffer: &[u8],
        source_name: &str,
    ) -> Result<MultiValue<'lua>> {
        let lua = &vm.lua;
        let handler = bridge::error_handler(lua, vm.handle)?;

        let chunk = match lua.load(buffer).set_name(source_name).into_function() {
            Ok(chunk) => chunk,
            Err(err) => {
                let message = compile_message(&err);
                self.host
                    .log_error(&format!("Failed to compile {}: {}", source_name, message));
                return Err(SessionError::Compile {
                    chunk: source_name.to_string(),
                    message,
                });
            }
        };

        let xpcall: Function = lua.named_registry_value(XPCALL_KEY)?;
        let outcome = xpcall.call::<_, MultiValue>((chunk, handler.function().clone()));
        let mut results = match outcome {
            Ok(results) => results.into_iter(),
            Err(err) => {
                let message = err.to_string();
                return Err(self.runtime_failure(&handler, source_name, message));
            }
        };
        match results.next() {
            Some(Value::Boolean(true)) => Ok(results.collect()),
            _ => {
                let message = match results.next() {
                    Some(Value::String(s)) => s.to_string_lossy().into_owned(),
                    _ => String::from("unknown error"),
                };
                Err(self.runtime_failure(&handler, source_name, message))
            }
        }
    }

    /// Build the error for a failed call, logging it unless the handler
    /// already did (memory errors bypass the handler)
    fn runtime_failure(
        &self,
        handler: &bridge::ErrorHandler<'_>,
        source_name: &str,
        message: String,
    ) -> SessionError {
        let err = SessionError::Runtime {
            chunk: source_name.to_string(),
            message,
        };
        if !handler.reported() {
            self.host.log_error(&err.to_string());
        }
        err
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
