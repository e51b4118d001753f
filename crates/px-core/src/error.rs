//! Core error types for pipe-exec

use px_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the pipe-exec ecosystem
#[derive(Error, Debug)]
pub enum PxError {
    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Credential store error
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Named-pipe transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Something other than a FIFO occupies a channel path
    #[error("Path exists and is not a FIFO: {0}")]
    NotAFifo(PathBuf),

    /// mkfifo failed
    #[error("Failed to create FIFO at {path}: {source}")]
    Create {
        path: PathBuf,
        source: nix::errno::Errno,
    },

    /// Opening the FIFO failed
    #[error("Failed to open FIFO at {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unlinking the FIFO failed
    #[error("Failed to remove FIFO at {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Any other filesystem failure on a channel path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Credential store errors
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Credential file not found
    #[error("Credential file not found: {0}")]
    NotFound(PathBuf),

    /// Credential file could not be read
    #[error("Failed to read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
