//! Command implementations

pub mod eval;
pub mod run;

use crate::config::Config;
use anyhow::Result;
use luahost_core::{HostContext, Session};
use luahost_modules::from_config;
use std::path::PathBuf;
use std::sync::Arc;

/// Build an initialized session from `config`.
///
/// `script_dir`, when given, is searched before the configured paths.
pub fn open_session(config: &Config, script_dir: Option<PathBuf>) -> Result<Session> {
    let mut modules = config.modules.clone();
    if let Some(dir) = script_dir {
        modules.search_paths.insert(0, dir);
    }

    let mut session = Session::new(config.session.clone())
        .with_file_loader(from_config(modules))
        .with_object_model(Arc::new(config.types.catalog()));

    let context: HostContext = Arc::new(config.clone());
    session.init(Some(context))?;
    Ok(session)
}
