//! Child process launching

use async_trait::async_trait;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;

use px_protocol::ExecCommand;

/// Outcome of a child that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// Process id assigned at spawn time
    pub pid: u32,
    /// How the child terminated
    pub status: ExitStatus,
}

/// Errors from launching or awaiting a child
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The system could not create another process
    #[error("Failed to create process for {program}: {source}")]
    Fork { program: String, source: io::Error },

    /// The process was created but the program could not be executed
    #[error("Failed to execute {program}: {source}")]
    Exec { program: String, source: io::Error },

    /// Waiting for the child failed
    #[error("Failed to wait for {program}: {source}")]
    Wait { program: String, source: io::Error },

    /// The child exited before its pid could be read
    #[error("No process id available for {program}")]
    MissingPid { program: String },
}

/// Runs an `EXEC` command and waits for it
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    async fn spawn(&self, command: &ExecCommand) -> Result<ChildExit, SpawnError>;
}

/// Spawner backed by `tokio::process`
///
/// The program is resolved through `PATH`. The child sees `argv()[0]` as its
/// own name, inherits stdout and stderr, and gets no stdin.
#[derive(Debug, Clone, Default)]
pub struct CommandSpawner {
    working_dir: Option<PathBuf>,
}

impl CommandSpawner {
    /// Create a spawner running children in the server's working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Run children in `dir` instead
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn build(&self, command: &ExecCommand) -> Command {
        let mut cmd = std::process::Command::new(command.program());
        if let Some((name, args)) = command.argv().split_first() {
            cmd.arg0(name).args(args);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        Command::from(cmd)
    }
}

#[async_trait]
impl ProcessSpawner for CommandSpawner {
    async fn spawn(&self, command: &ExecCommand) -> Result<ChildExit, SpawnError> {
        let program = command.program().to_string();

        let mut child = self
            .build(command)
            .spawn()
            .map_err(|source| classify(program.clone(), source))?;

        let Some(pid) = child.id() else {
            return Err(SpawnError::MissingPid { program });
        };

        tracing::debug!("Spawned {} as pid {}", command, pid);

        let status = child
            .wait()
            .await
            .map_err(|source| SpawnError::Wait { program, source })?;

        Ok(ChildExit { pid, status })
    }
}

/// Resource exhaustion means the process never existed; anything else is a
/// failure to execute the program image.
fn classify(program: String, source: io::Error) -> SpawnError {
    match source.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::OutOfMemory => {
            SpawnError::Fork { program, source }
        }
        _ => SpawnError::Exec { program, source },
    }
}
