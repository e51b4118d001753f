//! Per-connection session state

use std::fmt;

/// Authentication state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No successful `USER` yet
    #[default]
    Unauthenticated,
    /// A `USER` request matched a credential record
    Authenticated,
    /// The session ended; no further requests are read
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated => "authenticated",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// The single session served by one server process
///
/// Authentication is one-way: once authenticated, the session stays so until
/// it is closed. `Closed` is terminal.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// Create a new, unauthenticated session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Mark the session authenticated
    pub fn authenticate(&mut self) {
        if self.state == SessionState::Unauthenticated {
            self.state = SessionState::Authenticated;
        }
    }

    /// End the session
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}
