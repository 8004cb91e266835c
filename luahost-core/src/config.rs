//! Session configuration

use crate::error::{Result, SessionError};
use mlua::StdLib;
use serde::{Deserialize, Serialize};

/// Settings applied to every VM a session creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Standard libraries to open. `package` is always opened because the
    /// host searcher lives in `package.searchers`.
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,

    /// Upper bound on VM heap usage in bytes
    #[serde(default)]
    pub memory_limit: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            libraries: default_libraries(),
            memory_limit: None,
        }
    }
}

impl SessionConfig {
    /// Resolve the configured library names into a library set
    pub fn std_libs(&self) -> Result<StdLib> {
        let mut libs = StdLib::PACKAGE;
        for name in &self.libraries {
            libs = libs
                | match name.as_str() {
                    "coroutine" => StdLib::COROUTINE,
                    "table" => StdLib::TABLE,
                    "io" => StdLib::IO,
                    "os" => StdLib::OS,
                    "string" => StdLib::STRING,
                    "utf8" => StdLib::UTF8,
                    "math" => StdLib::MATH,
                    "package" => StdLib::PACKAGE,
                    other => return Err(SessionError::UnknownLibrary(other.to_string())),
                };
        }
        Ok(libs)
    }
}

fn default_libraries() -> Vec<String> {
    ["coroutine", "table", "io", "os", "string", "utf8", "math", "package"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}
