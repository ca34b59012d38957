//! Client configuration.
//!
//! The configured server version decides which protocol generation every
//! operation uses. It lives in the client, not in process globals, and is read
//! again on each call so a changed version applies to the next operation.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use docdb_common::{DbError, Result};
use serde::{Deserialize, Serialize};

use crate::dispatch::ServerVersion;

/// Env var that replaces the configuration file path.
pub const CONFIG_PATH_ENV: &str = "DOCDB_CONFIG";
/// Env var that overrides `server_version`.
pub const SERVER_VERSION_ENV: &str = "DOCDB_SERVER_VERSION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Lowest server version the client talks to (default: 3.0)
    pub server_version: ServerVersion,
}

impl ClientConfig {
    pub fn with_server_version(server_version: ServerVersion) -> Self {
        Self { server_version }
    }

    /// Load config from a TOML file, with environment variable overrides.
    /// Falls back to defaults if the file is not found. `DOCDB_CONFIG` overrides the path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        ConfigLoader::from_env().load(path)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DbError::Config(format!("Invalid client config: {e}")))
    }
}

/// Resolves configuration from file and environment variables.
struct ConfigLoader<F: Fn(&str) -> Option<String>> {
    lookup: F,
}

impl ConfigLoader<fn(&str) -> Option<String>> {
    fn from_env() -> Self {
        Self {
            lookup: |key| env::var(key).ok(),
        }
    }
}

impl<F: Fn(&str) -> Option<String>> ConfigLoader<F> {
    fn load<P: AsRef<Path>>(&self, default_path: P) -> Result<ClientConfig> {
        let cfg_path = (self.lookup)(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_path.as_ref().to_path_buf());

        let mut cfg = match fs::read_to_string(&cfg_path) {
            Ok(s) => {
                tracing::info!("Loaded client config from {}", cfg_path.display());
                ClientConfig::from_toml_str(&s)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No client config at {}, using defaults", cfg_path.display());
                ClientConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        self.apply_env_overrides(&mut cfg)?;
        Ok(cfg)
    }

    fn apply_env_overrides(&self, cfg: &mut ClientConfig) -> Result<()> {
        if let Some(version) = (self.lookup)(SERVER_VERSION_ENV) {
            cfg.server_version = version.parse().map_err(|e: DbError| {
                DbError::Config(format!("{SERVER_VERSION_ENV}: {}", e.message()))
            })?;
        }
        Ok(())
    }
}
