//! px-core: Core abstractions for pipe-exec
//!
//! This crate provides the configuration structures, error taxonomy,
//! credential store, named-pipe transport and logging capability shared by
//! the server and the client.

pub mod backoff;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fifo;
pub mod hash;
pub mod logger;

pub use credentials::CredentialStore;
pub use error::{ConfigError, CredentialError, PxError, TransportError};
pub use fifo::{ensure_channel, remove_channel, ChannelReceiver, ChannelSender};
pub use hash::{PasswordHasher, Sha512Crypt};
pub use logger::{Logger, RecordingLogger, TracingLogger};
