//! Configuration management for pipe-exec

mod channels;
mod client;
pub mod serde_utils;
mod server;

pub use channels::ChannelConfig;
pub use client::{BackoffConfig, ClientConfig};
pub use server::ServerConfig;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration file: shared channel paths plus per-role sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Named-pipe paths shared by both peers
    pub channels: ChannelConfig,
    /// Server settings
    pub server: ServerConfig,
    /// Client settings
    pub client: ClientConfig,
}

impl ConfigFile {
    /// Load from an explicit path, or from the default path when it exists
    ///
    /// A missing explicit file is an error; a missing default file yields the
    /// built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = match explicit {
            Some(path) => load_config(path)?,
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    load_config(&default_path)?
                } else {
                    tracing::debug!("No config at {:?}, using defaults", default_path);
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(backoff) = &self.client.backoff {
            backoff.validate()?;
        }
        Ok(())
    }
}

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pipe-exec")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}
