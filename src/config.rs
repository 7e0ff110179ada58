use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::PangaeaError;

pub const DEFAULT_CONFIG_FILE: &str = "pangaea.json";
pub const DEFAULT_BASE_URL: &str = "https://doi.pangaea.de/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const CACHE_DIR_NAME: &str = "pangaea-datasets";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub cache_dir: Utf8PathBuf,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads settings from `path`, or from `pangaea.json` in the working
    /// directory when present. An explicit path must exist.
    pub fn resolve(path: Option<&str>) -> Result<Settings, PangaeaError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PangaeaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PangaeaError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<Settings, PangaeaError> {
        let cache_dir = match config.cache_dir {
            Some(dir) => Utf8PathBuf::from(dir),
            None => default_cache_dir()?,
        };

        Ok(Settings {
            cache_dir,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            user_agent: config
                .user_agent
                .unwrap_or_else(|| format!("pangaea-datasets/{}", env!("CARGO_PKG_VERSION"))),
        })
    }
}

/// Platform cache directory, e.g. `~/.cache/pangaea-datasets` on Linux.
pub fn default_cache_dir() -> Result<Utf8PathBuf, PangaeaError> {
    BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.cache_dir().join(CACHE_DIR_NAME)).ok())
        .ok_or_else(|| PangaeaError::Filesystem("unable to resolve cache directory".to_string()))
}
