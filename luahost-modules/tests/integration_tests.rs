//! Integration tests for loaders driving real sessions

use luahost_core::{LogBuffer, Session, SessionConfig};
use luahost_modules::{from_config, CachingLoader, LoaderConfig, MemoryLoader};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn session_over(dir: &Path, log: Arc<LogBuffer>) -> Session {
    let loader = from_config(LoaderConfig {
        search_paths: vec![dir.to_path_buf()],
        ..Default::default()
    });
    let mut session = Session::new(SessionConfig::default())
        .with_file_loader(loader)
        .with_log(log);
    session.init(Some(Arc::new(()))).unwrap();
    session
}

#[test]
fn test_execute_file_and_require_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "main.lua",
        "local shapes = require('geometry.shapes')\nprint(shapes.area(3, 4))",
    );
    write(
        temp_dir.path(),
        "geometry/shapes.lua",
        "return { area = function(w, h) return w * h end }",
    );

    let log = Arc::new(LogBuffer::new());
    let session = session_over(temp_dir.path(), log.clone());

    assert!(session.execute_file("main.lua").is_none());
    assert_eq!(log.infos(), vec!["\t12"]);
    assert!(log.errors().is_empty());
}

#[test]
fn test_require_package_init() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "ui/init.lua", "return { name = 'ui' }");

    let log = Arc::new(LogBuffer::new());
    let session = session_over(temp_dir.path(), log);

    let values = session
        .evaluate(b"return require('ui').name", "main")
        .unwrap();
    assert_eq!(values, vec![json!("ui")]);
}

#[test]
fn test_errors_carry_file_names() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "lib/fail.lua", "local x = nil\nreturn x.field");

    let log = Arc::new(LogBuffer::new());
    let session = session_over(temp_dir.path(), log.clone());

    session.execute_file("lib/fail.lua");
    let errors = log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("lib/fail.lua:2:"), "unexpected: {}", errors[0]);
}

#[test]
fn test_traversal_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let scripts = temp_dir.path().join("scripts");
    fs::create_dir(&scripts).unwrap();
    write(temp_dir.path(), "secret.lua", "print('leaked')");

    let log = Arc::new(LogBuffer::new());
    let session = session_over(&scripts, log.clone());

    session.execute_file("../secret.lua");
    assert!(log.infos().is_empty());
    assert_eq!(log.errors(), vec!["Can't load file ../secret.lua"]);
}

#[test]
fn test_memory_loader_with_cache() {
    let loader = Arc::new(CachingLoader::new(
        MemoryLoader::new()
            .with_file("config", "return { level = 3 }")
            .with_file("boot.lua", "print(require('config').level)"),
        16,
    ));
    let log = Arc::new(LogBuffer::new());
    let mut session = Session::new(SessionConfig::default())
        .with_file_loader(loader.clone())
        .with_log(log.clone());
    session.init(Some(Arc::new(()))).unwrap();

    session.execute_file("boot.lua");
    assert_eq!(log.infos(), vec!["\t3"]);
    assert_eq!(loader.len(), 2);
}
