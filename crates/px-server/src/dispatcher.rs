//! Request dispatch
//!
//! Maps one request line plus the current session state to exactly one
//! response, applying the session transition on the way.

use std::sync::Arc;

use px_core::{CredentialStore, Logger, PasswordHasher};
use px_protocol::{Credentials, ExecCommand, ProtocolError, Request, Response, MAX_EXEC_ARGS};

use crate::session::Session;
use crate::spawner::{ProcessSpawner, SpawnError};

/// Whether the server keeps reading after a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    KeepOpen,
    Close,
}

/// Response to send plus what happens to the session afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub response: Response,
    pub disposition: Disposition,
}

impl Reply {
    fn keep_open(response: Response) -> Self {
        Self {
            response,
            disposition: Disposition::KeepOpen,
        }
    }

    fn close(response: Response) -> Self {
        Self {
            response,
            disposition: Disposition::Close,
        }
    }

    /// Whether the session ends with this reply
    pub fn closes_session(&self) -> bool {
        self.disposition == Disposition::Close
    }
}

/// Routes requests to authentication and process spawning
pub struct Dispatcher {
    store: CredentialStore,
    hasher: Box<dyn PasswordHasher>,
    spawner: Box<dyn ProcessSpawner>,
    logger: Arc<dyn Logger>,
    max_exec_args: usize,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(
        store: CredentialStore,
        hasher: Box<dyn PasswordHasher>,
        spawner: Box<dyn ProcessSpawner>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            store,
            hasher,
            spawner,
            logger,
            max_exec_args: MAX_EXEC_ARGS,
        }
    }

    /// Limit the number of words accepted after `EXEC`
    pub fn with_max_exec_args(mut self, max_exec_args: usize) -> Self {
        self.max_exec_args = max_exec_args;
        self
    }

    /// Handle one request line
    pub async fn dispatch(&self, session: &mut Session, line: &str) -> Reply {
        let request = Request::parse(line);
        match request {
            Request::Goodbye => {
                self.logger.info("GOODBYE received, closing session");
                session.close();
                Reply::close(Response::goodbye())
            }
            Request::User(credentials) => self.handle_user(session, &credentials),
            Request::Exec(words) => self.handle_exec(session, words).await,
            Request::Invalid { verb, reason } => {
                self.logger
                    .warn(&format!("Rejected malformed {}: {}", verb, reason));
                Reply::keep_open(Response::invalid_command())
            }
            Request::Unknown(verb) => {
                self.logger.warn(&format!("Unknown command {:?}", verb));
                Reply::keep_open(Response::unknown_command())
            }
        }
    }

    /// Answer a line that could not be decoded
    pub fn reject(&self, error: &ProtocolError) -> Reply {
        self.logger.warn(&format!("Rejected undecodable request: {}", error));
        Reply::keep_open(Response::invalid_command())
    }

    fn handle_user(&self, session: &mut Session, credentials: &Credentials) -> Reply {
        self.logger
            .info(&format!("USER request for {:?}", credentials.username));

        match self.store.lookup(
            &credentials.username,
            &credentials.password,
            self.hasher.as_ref(),
        ) {
            Ok(true) => {
                session.authenticate();
                self.logger
                    .info(&format!("Authenticated {:?}", credentials.username));
                Reply::keep_open(Response::account_valid())
            }
            Ok(false) => {
                self.logger
                    .warn(&format!("Invalid account {:?}", credentials.username));
                Reply::keep_open(Response::invalid_account())
            }
            Err(e) => {
                self.logger.error(&format!("Credential check failed: {}", e));
                Reply::keep_open(Response::internal_error())
            }
        }
    }

    async fn handle_exec(&self, session: &mut Session, words: Vec<String>) -> Reply {
        if !session.is_authenticated() {
            self.logger.warn("EXEC before authentication, closing session");
            session.close();
            return Reply::close(Response::unauthorized());
        }

        let command = match ExecCommand::from_words(words, self.max_exec_args) {
            Ok(command) => command,
            Err(e) => {
                self.logger.warn(&format!("Rejected malformed EXEC: {}", e));
                return Reply::keep_open(Response::invalid_command());
            }
        };

        self.logger.info(&format!("EXEC {}", command));

        match self.spawner.spawn(&command).await {
            Ok(exit) => {
                self.logger.info(&format!(
                    "Child {} exited with {}",
                    exit.pid, exit.status
                ));
                Reply::keep_open(Response::exec_succeeded(exit.pid))
            }
            Err(e) => {
                let kind = match e {
                    SpawnError::Fork { .. } => "fork",
                    SpawnError::Exec { .. } => "exec",
                    SpawnError::Wait { .. } | SpawnError::MissingPid { .. } => "wait",
                };
                self.logger.error(&format!("EXEC failed ({}): {}", kind, e));
                // Reads "Goodbye" but the session stays open.
                Reply::keep_open(Response::exec_failed())
            }
        }
    }
}
