//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::hash::DEFAULT_SALT;
use px_protocol::MAX_EXEC_ARGS;

/// Configuration for the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Credential file (`username password_hash` per line)
    pub credentials_file: PathBuf,

    /// Salt setting handed to the password hasher
    pub salt: String,

    /// Maximum number of words accepted after `EXEC`
    pub max_exec_args: usize,

    /// Working directory for spawned programs (defaults to the server's)
    pub working_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("passwords.txt"),
            salt: DEFAULT_SALT.to_string(),
            max_exec_args: MAX_EXEC_ARGS,
            working_dir: None,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}
