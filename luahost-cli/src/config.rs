//! Configuration handling for the luahost CLI

use anyhow::Result;
use luahost_core::{SessionConfig, TypeCatalog};
use luahost_modules::LoaderConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub modules: LoaderConfig,

    #[serde(default)]
    pub types: TypesConfig,
}

/// Names the CLI's type catalog knows about
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypesConfig {
    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub structs: Vec<String>,

    #[serde(default)]
    pub widgets: Vec<String>,
}

impl TypesConfig {
    pub fn catalog(&self) -> TypeCatalog {
        TypeCatalog::from_names(
            self.classes.clone(),
            self.structs.clone(),
            self.widgets.clone(),
        )
    }
}

/// Load configuration from file or use defaults
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    } else if let Some(home) = dirs::home_dir() {
        let default_path = home.join(".luahost").join("config.toml");
        if default_path.exists() {
            let content = std::fs::read_to_string(&default_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    } else {
        Ok(Config::default())
    }
}
