//! Server responses
//!
//! Every response is a single line prefixed with `+` (success) or `-`
//! (failure). Message texts are fixed per outcome.

use std::fmt;

use crate::error::ProtocolError;

/// Outcome marker of a response line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `+`
    Success,
    /// `-`
    Failure,
}

impl Status {
    /// Prefix character on the wire
    pub fn prefix(&self) -> char {
        match self {
            Status::Success => '+',
            Status::Failure => '-',
        }
    }
}

/// A single response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub message: String,
}

impl Response {
    /// Create a success response
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    /// Create a failure response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            message: message.into(),
        }
    }

    pub fn goodbye() -> Self {
        Self::ok("Goodbye")
    }

    pub fn account_valid() -> Self {
        Self::ok("Account valid")
    }

    pub fn invalid_account() -> Self {
        Self::err("Invalid account")
    }

    pub fn invalid_command() -> Self {
        Self::err("Invalid command")
    }

    pub fn unknown_command() -> Self {
        Self::err("Unknown command")
    }

    /// Reply to `EXEC` on an unauthenticated session
    pub fn unauthorized() -> Self {
        Self::err("Unauthorized. +Goodbye")
    }

    pub fn exec_succeeded(pid: u32) -> Self {
        Self::ok(format!("EXEC SUCCESSFUL PID {}", pid))
    }

    pub fn exec_failed() -> Self {
        Self::err("EXEC failed. Goodbye")
    }

    pub fn internal_error() -> Self {
        Self::err("Server internal error")
    }

    /// Decode a received line (terminator already stripped)
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut chars = line.chars();
        match chars.next() {
            Some('+') => Ok(Self::ok(chars.as_str())),
            Some('-') => Ok(Self::err(chars.as_str())),
            _ => Err(ProtocolError::MalformedResponse(line.to_string())),
        }
    }

    /// Whether the message text announces the end of the session
    pub fn mentions_goodbye(&self) -> bool {
        self.message.contains("Goodbye")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.status.prefix(), self.message)
    }
}
