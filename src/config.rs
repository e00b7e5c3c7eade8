use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::middleware::session::DEFAULT_COOKIE_NAME;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_ENV: &str = "CHIPMUNK_CONFIG";

/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// Names of the modules to load, in order.
    pub modules: Vec<String>,
    pub error: ErrorConfig,
    pub session: SessionConfig,
    /// Free application settings.
    pub settings: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorConfig {
    /// Render error details into error responses.
    pub display_errors: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Loads the file named by `CHIPMUNK_CONFIG` (defaults when unset),
    /// then applies the `LISTEN` override.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            config.server.listen_addr = listen_addr;
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Configuration(format!("invalid configuration: {e}")))
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }
}
