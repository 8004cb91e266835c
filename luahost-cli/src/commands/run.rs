//! Run command implementation

use super::open_session;
use crate::config::Config;
use anyhow::{anyhow, Result};
use luahost_core::ScriptValue;
use std::path::Path;
use tracing::debug;

/// Run the script at `path`, returning the values it produced
pub fn run_script(path: &Path, config: &Config) -> Result<Vec<ScriptValue>> {
    let path = path.canonicalize()?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Invalid script path: {}", path.display()))?;
    let script_dir = path.parent().map(Path::to_path_buf);

    debug!("Running {} from {:?}", file_name, script_dir);
    let session = open_session(config, script_dir)?;
    let values = session.evaluate_file(file_name)?;
    Ok(values)
}

pub fn run_file(path: &Path, config: &Config) -> Result<()> {
    run_script(path, config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_script_with_sibling_module() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("main.lua"),
            "return require('helper').answer",
        )
        .unwrap();
        fs::write(temp_dir.path().join("helper.lua"), "return { answer = 42 }").unwrap();

        let values = run_script(&temp_dir.path().join("main.lua"), &Config::default()).unwrap();
        assert_eq!(values, vec![json!(42)]);
    }

    #[test]
    fn test_run_script_uses_configured_types() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("types.lua");
        fs::write(&script, "return import('Actor').kind").unwrap();

        let mut config = Config::default();
        config.types.classes.push("Actor".to_string());
        assert_eq!(run_script(&script, &config).unwrap(), vec![json!("class")]);
    }

    #[test]
    fn test_run_script_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("fail.lua");
        fs::write(&script, "error('stop')").unwrap();

        let err = run_script(&script, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("fail.lua:1: stop"), "unexpected: {}", err);
    }

    #[test]
    fn test_run_missing_script() {
        let temp_dir = TempDir::new().unwrap();
        assert!(run_script(&temp_dir.path().join("absent.lua"), &Config::default()).is_err());
    }
}
