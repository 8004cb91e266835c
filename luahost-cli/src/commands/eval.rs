//! Eval command implementation

use super::open_session;
use crate::config::Config;
use anyhow::Result;
use luahost_core::ScriptValue;

const EVAL_CHUNK: &str = "=eval";

pub fn evaluate_code(code: &str, config: &Config) -> Result<Vec<ScriptValue>> {
    let session = open_session(config, None)?;
    let values = session.evaluate(code.as_bytes(), EVAL_CHUNK)?;
    Ok(values)
}

/// Evaluate `code` and print each result as JSON on its own line
pub fn eval_code(code: &str, config: &Config) -> Result<()> {
    for value in evaluate_code(code, config)? {
        println!("{}", serde_json::to_string(&value)?);
    }
    Ok(())
}
