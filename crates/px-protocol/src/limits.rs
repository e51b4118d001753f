//! Protocol size limits
//!
//! Lines and tokens are bounded. Exceeding a bound is reported as a
//! [`ProtocolError`](crate::ProtocolError), never truncated.

/// Maximum length of one line in bytes, excluding the `\n` terminator
pub const MAX_LINE_LENGTH: usize = 1023;

/// Maximum length of a username or password token in bytes
pub const MAX_CREDENTIAL_LENGTH: usize = 255;

/// Default maximum number of words following the `EXEC` verb
pub const MAX_EXEC_ARGS: usize = 128;

/// Maximum length of a single `EXEC` word in bytes
pub const MAX_EXEC_ARG_LENGTH: usize = 127;
