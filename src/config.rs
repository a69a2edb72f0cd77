//! Daemon configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `CLASHD_`-prefixed environment variables (nested keys split on `__`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::tracker::TrackerOptions;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "clashd.toml";

/// Where tracker state is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Nothing survives a restart
    #[default]
    Memory,
    /// Single JSON document
    Json { path: PathBuf },
    /// SQLite database file
    Sqlite { path: String },
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Player ids allowed to run GM-only operations
    #[serde(default)]
    pub gm_ids: Vec<String>,
    /// Clamp adjusted resources to `[0, max]`
    #[serde(default)]
    pub clamp_resources: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            storage: StorageConfig::Memory,
            gm_ids: Vec::new(),
            clamp_resources: false,
        }
    }
}

impl Config {
    /// Load configuration from defaults, a TOML file, and the environment.
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                figment = figment.merge(Toml::file(path));
            }
            None => figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        }

        let config = figment
            .merge(Env::prefixed("CLASHD_").split("__"))
            .extract()?;
        Ok(config)
    }

    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            clamp_resources: self.clamp_resources,
        }
    }
}
