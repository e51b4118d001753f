//! Protocol error types

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors that can occur during protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Line exceeds the maximum line length
    #[error("Line too long: exceeds maximum of {max} bytes")]
    LineTooLong { max: usize },

    /// Line is not valid UTF-8
    #[error("Line is not valid UTF-8")]
    InvalidEncoding,

    /// A single token exceeds its maximum length
    #[error("Token too long: {size} bytes exceeds maximum of {max} bytes")]
    TokenTooLong { size: usize, max: usize },

    /// Wrong number of arguments for a verb
    #[error("{verb} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        verb: &'static str,
        expected: String,
        actual: usize,
    },

    /// Received line is not a `+`/`-` response
    #[error("Malformed response: {0:?}")]
    MalformedResponse(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the stream can keep going after this error
    ///
    /// Decoding problems affect one line only; I/O failures affect the channel.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProtocolError::Io(_))
    }
}

impl From<LinesCodecError> for ProtocolError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => ProtocolError::LineTooLong {
                max: crate::MAX_LINE_LENGTH,
            },
            LinesCodecError::Io(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                ProtocolError::InvalidEncoding
            }
            LinesCodecError::Io(e) => ProtocolError::Io(e),
        }
    }
}
