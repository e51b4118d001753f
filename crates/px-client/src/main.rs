//! pipe-exec client
//!
//! Prompts for commands, sends each one to the server over the request pipe
//! and prints the server's response.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;

use px_client::output::{print_error, print_warning};
use px_client::{Client, ExitReason};
use px_core::config::ConfigFile;
use px_core::logger::init_tracing;
use px_core::{Logger, TracingLogger};

#[derive(Parser)]
#[command(name = "px-client")]
#[command(about = "pipe-exec client - sends USER and EXEC commands to a px-server")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

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
    if let Some(path) = args.request_pipe {
        config.channels.request = path;
    }
    if let Some(path) = args.response_pipe {
        config.channels.response = path;
    }
    if let Some(level) = args.log_level {
        config.client.log_level = level;
    }
    if let Some(path) = args.log_file {
        config.client.log_file = Some(path);
    }

    init_tracing(&config.client.log_level, config.client.log_file.as_deref())
        .context("Failed to initialize logging")?;

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("client"));
    let mut client = match Client::connect(&config.channels, &config.client, logger) {
        Ok(client) => client,
        Err(e) => {
            print_error(&format!("Cannot open server pipes: {}", e));
            return Err(e).context("Client setup failed");
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    match client.run(stdin, &mut stdout).await {
        Ok(ExitReason::EndOfInput) => {
            print_warning("Input closed, exiting");
            Ok(())
        }
        Ok(reason) => {
            tracing::debug!("Client finished: {:?}", reason);
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Connection to server lost: {}", e));
            Err(e).context("Client failed")
        }
    }
}
