//! px-protocol: Line protocol for pipe-exec
//!
//! This crate defines the newline-terminated text protocol spoken between
//! the client and the server over the two named pipes: request parsing,
//! response rendering, the line codec and the length limits.

pub mod codec;
pub mod error;
pub mod limits;
pub mod request;
pub mod response;

pub use codec::LineCodec;
pub use error::ProtocolError;
pub use limits::{MAX_CREDENTIAL_LENGTH, MAX_EXEC_ARGS, MAX_EXEC_ARG_LENGTH, MAX_LINE_LENGTH};
pub use request::{Credentials, ExecCommand, Request, Verb};
pub use response::{Response, Status};
