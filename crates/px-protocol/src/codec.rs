//! Tokio codec for newline-terminated protocol lines

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec};

use crate::error::ProtocolError;
use crate::limits::MAX_LINE_LENGTH;

/// Codec for encoding/decoding protocol lines
///
/// Lines longer than [`MAX_LINE_LENGTH`] are reported once as
/// [`ProtocolError::LineTooLong`]; the remainder of that line is discarded and
/// decoding resumes at the next terminator.
#[derive(Debug)]
pub struct LineCodec {
    inner: LinesCodec,
}

impl LineCodec {
    /// Create a new codec with the protocol line limit
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Create a codec with a custom line limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    /// Maximum accepted line length in bytes
    pub fn max_length(&self) -> usize {
        self.inner.max_length()
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.inner.decode(src).map_err(|e| self.limit_error(e))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.inner.decode_eof(src).map_err(|e| self.limit_error(e))
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = line.as_ref();
        if line.len() > self.max_length() {
            return Err(ProtocolError::LineTooLong {
                max: self.max_length(),
            });
        }
        self.inner.encode(line, dst).map_err(ProtocolError::from)
    }
}

impl LineCodec {
    fn limit_error(&self, err: tokio_util::codec::LinesCodecError) -> ProtocolError {
        match ProtocolError::from(err) {
            ProtocolError::LineTooLong { .. } => ProtocolError::LineTooLong {
                max: self.max_length(),
            },
            other => other,
        }
    }
}
