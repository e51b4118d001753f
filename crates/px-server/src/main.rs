//! pipe-exec server
//!
//! Creates the request and response pipes, serves one client session and
//! removes the pipes again on exit.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use px_core::config::ConfigFile;
use px_core::logger::init_tracing;
use px_core::{CredentialStore, Logger, Sha512Crypt, TracingLogger};
use px_server::{CommandSpawner, Dispatcher, Server};

#[derive(Parser)]
#[command(name = "px-server")]
#[command(about = "pipe-exec server - runs programs for authenticated clients")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Credential file (overrides config)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Client-to-server pipe (overrides config)
    #[arg(long)]
    request_pipe: Option<PathBuf>,

    /// Server-to-client pipe (overrides config)
    #[arg(long)]
    response_pipe: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigFile::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Apply overrides
    if let Some(path) = args.credentials {
        config.server.credentials_file = path;
    }
    if let Some(path) = args.request_pipe {
        config.channels.request = path;
    }
    if let Some(path) = args.response_pipe {
        config.channels.response = path;
    }
    if let Some(level) = args.log_level {
        config.server.log_level = level;
    }
    if let Some(path) = args.log_file {
        config.server.log_file = Some(path);
    }

    init_tracing(&config.server.log_level, config.server.log_file.as_deref())
        .context("Failed to initialize logging")?;

    tracing::info!("pipe-exec server starting...");

    let store = CredentialStore::load(&config.server.credentials_file).with_context(|| {
        format!(
            "Failed to load credentials from {:?}",
            config.server.credentials_file
        )
    })?;
    if store.is_empty() {
        tracing::warn!("No credential records loaded - every USER request will be rejected");
    }

    let hasher = Sha512Crypt::new(&config.server.salt).context("Invalid salt setting")?;

    let mut spawner = CommandSpawner::new();
    if let Some(dir) = &config.server.working_dir {
        spawner = spawner.with_working_dir(dir);
    }

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("server"));
    let dispatcher = Dispatcher::new(
        store,
        Box::new(hasher),
        Box::new(spawner),
        Arc::clone(&logger),
    )
    .with_max_exec_args(config.server.max_exec_args);
    let server = Server::new(config.channels, dispatcher, logger);

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    server.run(cancel).await.context("Server failed")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
