//! Duplex channel over two named pipes
//!
//! Each peer opens its pipes read+write so that `open` never waits for the
//! other side. A consequence is that the reading end rarely observes
//! end-of-input; when it does, the receiver can be rebuilt in place with
//! [`ChannelReceiver::reconnect`] or [`ChannelReceiver::reopen`].

use bytes::BytesMut;
use nix::errno::Errno;
use nix::sys::stat::Mode;
use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::ChannelConfig;
use crate::error::TransportError;
use px_protocol::{LineCodec, ProtocolError};

/// Initial read buffer capacity
const READ_CAPACITY: usize = 1024;

/// Create a FIFO at `path` unless one already exists
///
/// Returns `true` when this call created it. The permission bits are applied
/// after creation so the process umask cannot narrow them. A regular file or
/// directory at `path` is refused.
pub fn ensure_channel(path: &Path, mode: u32) -> Result<bool, TransportError> {
    match fifo_status(path)? {
        Some(true) => return Ok(false),
        Some(false) => return Err(TransportError::NotAFifo(path.to_path_buf())),
        None => {}
    }

    match nix::unistd::mkfifo(path, Mode::from_bits_truncate(mode as _)) {
        Ok(()) => {
            fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|source| {
                TransportError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            tracing::debug!("Created FIFO {:?} with mode {:o}", path, mode);
            Ok(true)
        }
        // The peer won the race
        Err(Errno::EEXIST) => match fifo_status(path)? {
            Some(true) => Ok(false),
            _ => Err(TransportError::NotAFifo(path.to_path_buf())),
        },
        Err(source) => Err(TransportError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Remove the FIFO at `path`; a missing entry is not an error
pub fn remove_channel(path: &Path) -> Result<(), TransportError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed FIFO {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(TransportError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// `None` when nothing exists at `path`, otherwise whether it is a FIFO
fn fifo_status(path: &Path) -> Result<Option<bool>, TransportError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.file_type().is_fifo())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TransportError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn open_receiver(path: &Path) -> Result<pipe::Receiver, TransportError> {
    pipe::OpenOptions::new()
        .read_write(true)
        .open_receiver(path)
        .map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn open_sender(path: &Path) -> Result<pipe::Sender, TransportError> {
    pipe::OpenOptions::new()
        .read_write(true)
        .open_sender(path)
        .map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })
}

impl ChannelConfig {
    /// Ensure both pipes exist
    ///
    /// If the response path is refused, a request pipe created by this call
    /// is removed again.
    pub fn ensure(&self) -> Result<(), TransportError> {
        let created = ensure_channel(&self.request, self.mode)?;
        if let Err(e) = ensure_channel(&self.response, self.mode) {
            if created {
                if let Err(cleanup) = remove_channel(&self.request) {
                    tracing::warn!("Failed to undo {:?}: {}", self.request, cleanup);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove both pipes, attempting the second even if the first fails
    pub fn remove(&self) -> Result<(), TransportError> {
        let request = remove_channel(&self.request);
        let response = remove_channel(&self.response);
        request.and(response)
    }
}

/// Reading end of one pipe, yielding protocol lines
#[derive(Debug)]
pub struct ChannelReceiver {
    path: PathBuf,
    mode: u32,
    pipe: pipe::Receiver,
    buffer: BytesMut,
    codec: LineCodec,
}

impl ChannelReceiver {
    /// Open the FIFO at `path` for reading
    ///
    /// `mode` is used if the pipe has to be recreated later.
    pub fn open(path: impl Into<PathBuf>, mode: u32) -> Result<Self, TransportError> {
        let path = path.into();
        let pipe = open_receiver(&path)?;
        Ok(Self {
            path,
            mode,
            pipe,
            buffer: BytesMut::with_capacity(READ_CAPACITY),
            codec: LineCodec::new(),
        })
    }

    /// Path of the underlying FIFO
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Receive one line
    ///
    /// Returns `Ok(None)` when the read primitive reports end-of-input and no
    /// partial line is pending. Over-long and non-UTF-8 lines surface as
    /// recoverable errors; the next call continues with the following line.
    pub async fn receive_line(&mut self) -> Result<Option<String>, ProtocolError> {
        loop {
            if let Some(line) = self.codec.decode(&mut self.buffer)? {
                return Ok(Some(line));
            }

            let read = self.pipe.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return self.codec.decode_eof(&mut self.buffer);
            }
        }
    }

    /// Delete the entry at the receiving path, recreate it and reopen it
    ///
    /// Any buffered bytes from the previous pipe are discarded.
    pub async fn reconnect(&mut self) -> Result<(), TransportError> {
        remove_channel(&self.path)?;
        self.reopen().await
    }

    /// Recreate the pipe if it is missing and reopen it without deleting
    pub async fn reopen(&mut self) -> Result<(), TransportError> {
        ensure_channel(&self.path, self.mode)?;
        self.pipe = open_receiver(&self.path)?;
        self.buffer.clear();
        self.codec = LineCodec::new();
        tracing::debug!("Reopened {:?}", self.path);
        Ok(())
    }
}

/// Writing end of one pipe
#[derive(Debug)]
pub struct ChannelSender {
    path: PathBuf,
    pipe: pipe::Sender,
    codec: LineCodec,
    buffer: BytesMut,
}

impl ChannelSender {
    /// Open the FIFO at `path` for writing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TransportError> {
        let path = path.into();
        let pipe = open_sender(&path)?;
        Ok(Self {
            path,
            pipe,
            codec: LineCodec::new(),
            buffer: BytesMut::new(),
        })
    }

    /// Path of the underlying FIFO
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `line` followed by a newline and flush
    pub async fn send_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        self.buffer.clear();
        self.codec.encode(line, &mut self.buffer)?;
        self.pipe.write_all(&self.buffer).await?;
        self.pipe.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn is_fifo(path: &Path) -> bool {
        fs::metadata(path)
            .map(|m| m.file_type().is_fifo())
            .unwrap_or(false)
    }

    #[test]
    fn test_ensure_creates_fifo_with_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("req");

        assert!(ensure_channel(&path, 0o666).unwrap());
        assert!(is_fifo(&path));
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);

        // Second call is a no-op
        assert!(!ensure_channel(&path, 0o666).unwrap());
        assert!(is_fifo(&path));
    }

    #[test]
    fn test_ensure_refuses_regular_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not-a-pipe");
        fs::write(&path, "data").unwrap();

        let err = ensure_channel(&path, 0o666).unwrap_err();
        assert!(matches!(err, TransportError::NotAFifo(_)));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone");
        remove_channel(&path).unwrap();

        ensure_channel(&path, 0o600).unwrap();
        remove_channel(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_channel_config_ensure_and_remove() {
        let dir = tempdir().unwrap();
        let channels = ChannelConfig {
            request: dir.path().join("c"),
            response: dir.path().join("s"),
            mode: 0o666,
        };

        channels.ensure().unwrap();
        assert!(is_fifo(&channels.request));
        assert!(is_fifo(&channels.response));

        channels.remove().unwrap();
        assert!(!channels.request.exists());
        assert!(!channels.response.exists());
    }

    #[test]
    fn test_channel_config_ensure_undoes_partial_setup() {
        let dir = tempdir().unwrap();
        let channels = ChannelConfig {
            request: dir.path().join("c"),
            response: dir.path().join("s"),
            mode: 0o666,
        };
        fs::write(&channels.response, "occupied").unwrap();

        let err = channels.ensure().unwrap_err();
        assert!(matches!(err, TransportError::NotAFifo(_)));
        assert!(!channels.request.exists());
        assert!(channels.response.is_file());

        // A request pipe that was already there is left alone
        ensure_channel(&channels.request, 0o666).unwrap();
        assert!(channels.ensure().is_err());
        assert!(is_fifo(&channels.request));
    }

    #[tokio::test]
    async fn test_send_and_receive_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipe");
        ensure_channel(&path, 0o666).unwrap();

        let mut receiver = ChannelReceiver::open(&path, 0o666).unwrap();
        let mut sender = ChannelSender::open(&path).unwrap();

        sender.send_line("USER alice secret").await.unwrap();
        sender.send_line("GOODBYE").await.unwrap();

        assert_eq!(
            receiver.receive_line().await.unwrap(),
            Some("USER alice secret".to_string())
        );
        assert_eq!(receiver.receive_line().await.unwrap(), Some("GOODBYE".to_string()));
    }

    #[tokio::test]
    async fn test_bad_lines_are_recoverable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipe");
        ensure_channel(&path, 0o666).unwrap();

        let mut receiver = ChannelReceiver::open(&path, 0o666).unwrap();

        let mut raw = fs::OpenOptions::new().write(true).open(&path).unwrap();
        let mut payload = vec![b'a'; 2000];
        payload.push(b'\n');
        payload.extend_from_slice(b"\xff\xfe\n");
        payload.extend_from_slice(b"GOODBYE\n");
        raw.write_all(&payload).unwrap();

        let err = receiver.receive_line().await.unwrap_err();
        assert!(matches!(err, ProtocolError::LineTooLong { .. }));

        let err = receiver.receive_line().await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidEncoding));
        assert!(err.is_recoverable());

        assert_eq!(receiver.receive_line().await.unwrap(), Some("GOODBYE".to_string()));
    }

    #[tokio::test]
    async fn test_reconnect_recreates_deleted_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipe");
        ensure_channel(&path, 0o666).unwrap();

        let mut receiver = ChannelReceiver::open(&path, 0o666).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(!path.exists());

        receiver.reconnect().await.unwrap();
        assert!(is_fifo(&path));

        let mut sender = ChannelSender::open(&path).unwrap();
        sender.send_line("+Account valid").await.unwrap();
        assert_eq!(
            receiver.receive_line().await.unwrap(),
            Some("+Account valid".to_string())
        );
    }

    #[tokio::test]
    async fn test_reopen_keeps_existing_pipe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipe");
        ensure_channel(&path, 0o666).unwrap();

        let mut receiver = ChannelReceiver::open(&path, 0o666).unwrap();
        let mut sender = ChannelSender::open(&path).unwrap();

        receiver.reopen().await.unwrap();
        sender.send_line("GOODBYE").await.unwrap();
        assert_eq!(receiver.receive_line().await.unwrap(), Some("GOODBYE".to_string()));
    }

    #[tokio::test]
    async fn test_open_missing_path_fails() {
        let dir = tempdir().unwrap();
        let err = ChannelSender::open(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }
}
