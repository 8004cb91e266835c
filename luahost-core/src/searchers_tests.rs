use super::*;
use crate::catalog::TypeCatalog;
use crate::host::LogBuffer;
use crate::registry::{self, SessionHost};
use proptest::prelude::*;
use std::sync::Arc;

fn names(table: &Table) -> Vec<String> {
    table
        .clone()
        .sequence_values::<String>()
        .collect::<mlua::Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn test_splice_into_preload_only_chain() {
    let mut chain = vec!["R1"];
    splice(&mut chain, "Loader");
    assert_eq!(chain, vec!["R1", "Loader"]);

    splice(&mut chain, "Loader2");
    assert_eq!(chain, vec!["R1", "Loader2", "Loader"]);
}

#[test]
fn test_splice_into_default_chain() {
    let mut chain = vec!["preload", "lua", "c", "croot"];
    splice(&mut chain, "host");
    assert_eq!(chain, vec!["preload", "host", "lua", "c", "croot"]);
}

#[test]
fn test_splice_into_empty_chain() {
    let mut chain: Vec<&str> = Vec::new();
    splice(&mut chain, "host");
    assert_eq!(chain, vec!["host"]);
}

proptest! {
    #[test]
    fn prop_splice_preserves_order(chain in proptest::collection::vec(any::<u32>(), 1..32)) {
        let original = chain.clone();
        let mut spliced = chain;
        splice(&mut spliced, u32::MAX);

        prop_assert_eq!(spliced.len(), original.len() + 1);
        prop_assert_eq!(spliced[0], original[0]);
        prop_assert_eq!(spliced[SEARCHER_SLOT - 1], u32::MAX);
        prop_assert_eq!(&spliced[SEARCHER_SLOT..], &original[SEARCHER_SLOT - 1..]);
    }
}

#[test]
fn test_splice_table_shifts_entries() {
    let lua = Lua::new();
    let table: Table = lua.load("return { 'R1' }").eval().unwrap();

    splice_table(&table, Value::String(lua.create_string("Loader").unwrap())).unwrap();
    assert_eq!(names(&table), vec!["R1", "Loader"]);

    splice_table(&table, Value::String(lua.create_string("Loader2").unwrap())).unwrap();
    assert_eq!(names(&table), vec!["R1", "Loader2", "Loader"]);
}

#[test]
fn test_install_places_searcher_second() {
    let lua = Lua::new();
    let before = lua
        .load("return #package.searchers")
        .eval::<i64>()
        .unwrap();
    lua.load("original = { table.unpack(package.searchers) }")
        .exec()
        .unwrap();

    install(&lua, VmHandle::next()).unwrap();

    let after = lua
        .load("return #package.searchers")
        .eval::<i64>()
        .unwrap();
    assert_eq!(after, before + 1);

    let preserved: bool = lua
        .load(
            r#"
            if package.searchers[1] ~= original[1] then return false end
            for i = 2, #original do
                if package.searchers[i + 1] ~= original[i] then return false end
            end
            return type(package.searchers[2]) == "function"
            "#,
        )
        .eval()
        .unwrap();
    assert!(preserved);
}

struct Host {
    lua: Lua,
    handle: VmHandle,
    log: Arc<LogBuffer>,
    _host: Arc<SessionHost>,
}

impl Drop for Host {
    fn drop(&mut self) {
        registry::unregister(self.handle);
    }
}

fn host_with_files(files: &'static [(&'static str, &'static str)]) -> Host {
    let log = Arc::new(LogBuffer::new());
    let host = Arc::new(SessionHost::new(Arc::new(TypeCatalog::new()), log.clone()));
    host.set_file_loader(Some(Arc::new(move |name: &str| {
        files
            .iter()
            .find(|(file, _)| *file == name)
            .map(|(_, source)| source.as_bytes().to_vec())
    })));

    let lua = Lua::new();
    let handle = VmHandle::next();
    registry::register(handle, &host);
    install(&lua, handle).unwrap();

    Host {
        lua,
        handle,
        log,
        _host: host,
    }
}

#[test]
fn test_require_uses_host_files() {
    let host = host_with_files(&[("greeting", "return { text = 'hello' }")]);
    let text: String = host
        .lua
        .load("return require('greeting').text")
        .eval()
        .unwrap();
    assert_eq!(text, "hello");
    assert!(host.log.errors().is_empty());
}

#[test]
fn test_required_chunk_is_named_after_module() {
    let host = host_with_files(&[("thrower", "error('boom')")]);
    let chunk = resolve(&host.lua, host.handle, "thrower").unwrap().unwrap();
    let err = chunk.call::<_, ()>(()).unwrap_err();
    assert!(err.to_string().contains("thrower:1: boom"), "unexpected error: {}", err);
}

#[test]
fn test_missing_module_logs_and_falls_through() {
    let host = host_with_files(&[]);
    host.lua
        .load("package.path = ''; package.cpath = ''")
        .exec()
        .unwrap();

    let err = host.lua.load("require('absent')").exec().unwrap_err();
    assert!(err.to_string().contains("module 'absent' not found"));
    assert_eq!(host.log.errors(), vec!["Can't load file absent"]);
}

#[test]
fn test_preload_short_circuits_host_searcher() {
    let host = host_with_files(&[]);
    host.lua
        .load("package.preload['cached'] = function() return 'from preload' end")
        .exec()
        .unwrap();

    let value: String = host.lua.load("return require('cached')").eval().unwrap();
    assert_eq!(value, "from preload");
    assert!(host.log.errors().is_empty());
}

#[test]
fn test_broken_module_logs_compiler_error() {
    let host = host_with_files(&[("broken", "return {")]);

    assert!(resolve(&host.lua, host.handle, "broken").unwrap().is_none());
    let errors = host.log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("broken:1:"), "unexpected message: {}", errors[0]);
}

#[test]
fn test_resolve_without_owner_fails() {
    let lua = Lua::new();
    let err = resolve(&lua, VmHandle::next(), "anything").unwrap_err();
    assert!(err.to_string().contains("has no owning session"));
}
