use std::{fs, path::PathBuf};

use common::envelope::DEFAULT_SEGMENT_SIZE;
use object_store::ObjectStoreConfig;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "drs-client";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Everything the client needs to talk to a DRS server and its bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the DRS server
    pub drs_url: Url,
    /// Client secret key used when uploading in encrypted mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_key: Option<PathBuf>,
    /// Plaintext bytes per encrypted block
    #[serde(default = "default_segment_size")]
    pub segment_size: u32,
    /// Where uploaded objects are stored
    #[serde(default)]
    pub storage: ObjectStoreConfig,
}

fn default_segment_size() -> u32 {
    DEFAULT_SEGMENT_SIZE
}

impl Config {
    pub fn new(drs_url: Url, storage: ObjectStoreConfig) -> Self {
        Self {
            drs_url,
            client_secret_key: None,
            segment_size: default_segment_size(),
            storage,
        }
    }

    /// Get the config file path (custom or default ~/.drs-client/config.toml)
    pub fn path(custom_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)).join(CONFIG_FILE_NAME))
    }

    /// Load the config file
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = Self::path(custom_path)?;
        if !path.exists() {
            return Err(ConfigError::NotConfigured(path));
        }

        let config_toml = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&config_toml)?;
        Ok(config)
    }

    /// Write the config file, creating its directory if needed. Returns where it went.
    pub fn save(&self, custom_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        let path = Self::path(custom_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_toml = toml::to_string_pretty(self)?;
        fs::write(&path, config_toml)?;
        Ok(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration found at {0}. Run 'drs-client configure' first")]
    NotConfigured(PathBuf),

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
