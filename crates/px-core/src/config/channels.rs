//! Named-pipe channel configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::serde_utils::octal_mode;

/// Default client-to-server pipe
pub const DEFAULT_REQUEST_PIPE: &str = "/tmp/my_c_fifo";

/// Default server-to-client pipe
pub const DEFAULT_RESPONSE_PIPE: &str = "/tmp/my_s_fifo";

/// Default permission bits for newly created pipes
pub const DEFAULT_CHANNEL_MODE: u32 = 0o666;

/// The two well-known pipe paths forming one duplex channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Client-to-server pipe
    pub request: PathBuf,

    /// Server-to-client pipe
    pub response: PathBuf,

    /// Permission bits applied when a pipe is created
    #[serde(with = "octal_mode")]
    pub mode: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            request: PathBuf::from(DEFAULT_REQUEST_PIPE),
            response: PathBuf::from(DEFAULT_RESPONSE_PIPE),
            mode: DEFAULT_CHANNEL_MODE,
        }
    }
}
