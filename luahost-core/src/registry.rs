//! Process-wide map from VM handles to the sessions that own them
//!
//! Lua callbacks only ever see a `&Lua`; every bridge closure captures the
//! [`VmHandle`] of its VM and recovers the owning [`SessionHost`] here.
//! Entries are weak so a dropped session can never be handed back.

use crate::host::{FileLoader, HostContext, HostLog, ObjectModel};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Opaque identifier of one running VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VmHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

impl VmHandle {
    /// Allocate a handle that has never been used in this process
    pub fn next() -> Self {
        VmHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild a handle from its raw id
    pub fn from_raw(id: u64) -> Self {
        VmHandle(id)
    }

    /// The raw id of this handle
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Host services a session exposes to the callbacks of its VM
pub struct SessionHost {
    file_loader: RwLock<Option<Arc<dyn FileLoader>>>,
    object_model: RwLock<Arc<dyn ObjectModel>>,
    log: RwLock<Arc<dyn HostLog>>,
    context: RwLock<Option<HostContext>>,
}

impl SessionHost {
    pub(crate) fn new(object_model: Arc<dyn ObjectModel>, log: Arc<dyn HostLog>) -> Self {
        Self {
            file_loader: RwLock::new(None),
            object_model: RwLock::new(object_model),
            log: RwLock::new(log),
            context: RwLock::new(None),
        }
    }

    /// Request bytes for `name` from the configured loader.
    ///
    /// Logs `Can't load file <name>` when there is no loader or it has nothing.
    pub fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        let loader = self.file_loader.read().clone();
        let bytes = loader.and_then(|loader| loader.load_file(name));
        if bytes.is_none() {
            self.log_error(&format!("Can't load file {}", name));
        }
        bytes
    }

    /// Whether a file loader is configured
    pub fn has_file_loader(&self) -> bool {
        self.file_loader.read().is_some()
    }

    /// The object model used by `import` and `loadUI`
    pub fn object_model(&self) -> Arc<dyn ObjectModel> {
        self.object_model.read().clone()
    }

    /// The host context of the current initialization
    pub fn context(&self) -> Option<HostContext> {
        self.context.read().clone()
    }

    /// Forward a message to host info logging
    pub fn log_info(&self, message: &str) {
        self.log.read().info(message);
    }

    /// Forward a message to host error logging
    pub fn log_error(&self, message: &str) {
        self.log.read().error(message);
    }

    pub(crate) fn set_file_loader(&self, loader: Option<Arc<dyn FileLoader>>) {
        *self.file_loader.write() = loader;
    }

    pub(crate) fn set_object_model(&self, model: Arc<dyn ObjectModel>) {
        *self.object_model.write() = model;
    }

    pub(crate) fn set_log(&self, log: Arc<dyn HostLog>) {
        *self.log.write() = log;
    }

    pub(crate) fn set_context(&self, context: Option<HostContext>) {
        *self.context.write() = context;
    }
}

static SESSIONS: Lazy<RwLock<FxHashMap<VmHandle, Weak<SessionHost>>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Map `handle` to `host`, replacing any previous entry
pub fn register(handle: VmHandle, host: &Arc<SessionHost>) {
    SESSIONS.write().insert(handle, Arc::downgrade(host));
    trace!("Registered VM {}", handle);
}

/// Find the session that owns `handle`
pub fn lookup(handle: VmHandle) -> Option<Arc<SessionHost>> {
    SESSIONS.read().get(&handle).and_then(Weak::upgrade)
}

/// Remove the entry for `handle` if there is one
pub fn unregister(handle: VmHandle) {
    if SESSIONS.write().remove(&handle).is_some() {
        trace!("Unregistered VM {}", handle);
    }
}

/// Whether `handle` currently has an entry
pub fn contains(handle: VmHandle) -> bool {
    SESSIONS.read().contains_key(&handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::host::LogBuffer;

    fn test_host() -> Arc<SessionHost> {
        Arc::new(SessionHost::new(
            Arc::new(TypeCatalog::new()),
            Arc::new(LogBuffer::new()),
        ))
    }

    #[test]
    fn test_handles_are_unique() {
        let a = VmHandle::next();
        let b = VmHandle::next();
        assert_ne!(a, b);
        assert_eq!(VmHandle::from_raw(a.as_raw()), a);
    }

    #[test]
    fn test_register_lookup_unregister() {
        let host = test_host();
        let handle = VmHandle::next();

        assert!(lookup(handle).is_none());
        register(handle, &host);
        let found = lookup(handle).unwrap();
        assert!(Arc::ptr_eq(&found, &host));

        unregister(handle);
        assert!(lookup(handle).is_none());
        assert!(!contains(handle));

        // Removing twice is a no-op
        unregister(handle);
    }

    #[test]
    fn test_register_overwrites() {
        let first = test_host();
        let second = test_host();
        let handle = VmHandle::next();

        register(handle, &first);
        register(handle, &second);
        assert!(Arc::ptr_eq(&lookup(handle).unwrap(), &second));
        unregister(handle);
    }

    #[test]
    fn test_dropped_host_is_not_returned() {
        let handle = VmHandle::next();
        {
            let host = test_host();
            register(handle, &host);
        }
        assert!(lookup(handle).is_none());
        unregister(handle);
    }

    #[test]
    fn test_read_file_without_loader_logs() {
        let log = Arc::new(LogBuffer::new());
        let host = SessionHost::new(Arc::new(TypeCatalog::new()), log.clone());

        assert!(!host.has_file_loader());
        assert!(host.read_file("missing.lua").is_none());
        assert_eq!(log.errors(), vec!["Can't load file missing.lua".to_string()]);
    }

    #[test]
    fn test_read_file_with_loader() {
        let log = Arc::new(LogBuffer::new());
        let host = SessionHost::new(Arc::new(TypeCatalog::new()), log.clone());
        host.set_file_loader(Some(Arc::new(|name: &str| {
            (name == "present.lua").then(|| b"return 1".to_vec())
        })));

        assert_eq!(host.read_file("present.lua").unwrap(), b"return 1".to_vec());
        assert!(log.errors().is_empty());
        assert!(host.read_file("absent.lua").is_none());
        assert_eq!(log.errors().len(), 1);
    }
}
