//! Logging capability and subscriber setup
//!
//! Components receive an `Arc<dyn Logger>` instead of reaching for a global.
//! [`TracingLogger`] forwards to `tracing`; [`RecordingLogger`] keeps entries
//! in memory so tests can assert on them.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

pub use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Leveled logging sink
pub trait Logger: Send + Sync {
    /// Record `message` at `level`
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Logger that emits `tracing` events under a fixed component name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    /// Create a logger tagging every event with `component`
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        let component = self.component;
        match level {
            Level::ERROR => tracing::error!(component, "{}", message),
            Level::WARN => tracing::warn!(component, "{}", message),
            Level::INFO => tracing::info!(component, "{}", message),
            Level::DEBUG => tracing::debug!(component, "{}", message),
            _ => tracing::trace!(component, "{}", message),
        }
    }
}

/// Logger that stores entries in memory
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Whether any entry at `level` contains `needle`
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

/// Install the global `tracing` subscriber for a binary
///
/// `RUST_LOG` overrides `level`. With `log_file` set, events are appended to
/// that file instead of being written to stderr.
pub fn init_tracing(level: &str, log_file: Option<&Path>) -> io::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
    );

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}
