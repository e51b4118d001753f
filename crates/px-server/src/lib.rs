//! px-server: Command server behind a pair of named pipes
//!
//! The server reads one request line at a time from the request pipe,
//! authenticates the client against a credential file and, once
//! authenticated, runs programs on its behalf. Every request is answered with
//! exactly one response line on the response pipe.

pub mod dispatcher;
pub mod server;
pub mod session;
pub mod spawner;

pub use dispatcher::{Dispatcher, Disposition, Reply};
pub use server::Server;
pub use session::{Session, SessionState};
pub use spawner::{ChildExit, CommandSpawner, ProcessSpawner, SpawnError};
