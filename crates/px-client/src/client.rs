//! Interactive client loop
//!
//! One request, one response: the operator's line is written to the request
//! pipe verbatim and the client blocks until the server answers. If the
//! response pipe reports no data, the client deletes and recreates it and
//! keeps waiting.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use px_core::backoff::ExponentialBackoff;
use px_core::config::{BackoffConfig, ChannelConfig, ClientConfig};
use px_core::{ChannelReceiver, ChannelSender, Logger, PxError, TransportError};
use px_protocol::{ProtocolError, Response, MAX_LINE_LENGTH};

/// Text shown before every operator command
pub const PROMPT: &str = "Enter command (USER or EXEC) or QUIT to exit:\n> ";

/// Where responses come from
#[async_trait]
pub trait ResponseSource: Send {
    /// Read one line; `Ok(None)` means no data was available
    async fn receive_line(&mut self) -> Result<Option<String>, ProtocolError>;

    /// Recreate the underlying channel after a failed read
    async fn reconnect(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
impl ResponseSource for ChannelReceiver {
    async fn receive_line(&mut self) -> Result<Option<String>, ProtocolError> {
        ChannelReceiver::receive_line(self).await
    }

    async fn reconnect(&mut self) -> Result<(), TransportError> {
        ChannelReceiver::reconnect(self).await
    }
}

/// Wait for the next well-formed response
///
/// End-of-input and read failures trigger [`ResponseSource::reconnect`] and
/// another attempt, forever. Without `backoff` the retry is immediate; with
/// it, the delay grows per attempt and resets once a response arrives.
/// Undecodable or unprefixed lines are logged and skipped. Only a failed
/// reconnect is returned as an error.
pub async fn await_response<S: ResponseSource + ?Sized>(
    source: &mut S,
    mut backoff: Option<&mut ExponentialBackoff>,
    logger: &dyn Logger,
) -> Result<Response, PxError> {
    loop {
        match source.receive_line().await {
            Ok(Some(line)) => match Response::parse(&line) {
                Ok(response) => {
                    if let Some(backoff) = backoff.as_deref_mut() {
                        backoff.reset();
                    }
                    return Ok(response);
                }
                Err(e) => {
                    logger.warn(&format!("Ignoring response: {}", e));
                    continue;
                }
            },
            Ok(None) => logger.debug("No data on response pipe, reconnecting"),
            Err(e) if e.is_recoverable() => {
                logger.warn(&format!("Ignoring response: {}", e));
                continue;
            }
            Err(e) => logger.warn(&format!("Read failed: {}, reconnecting", e)),
        }

        source.reconnect().await?;

        if let Some(backoff) = backoff.as_deref_mut() {
            tokio::time::sleep(backoff.next_delay()).await;
        }
    }
}

/// Why [`Client::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The operator typed `QUIT`
    Quit,
    /// The operator's input ended
    EndOfInput,
    /// The server's response said goodbye
    Goodbye,
}

/// Client end of a channel pair
pub struct Client<S = ChannelReceiver> {
    requests: ChannelSender,
    responses: S,
    backoff: Option<ExponentialBackoff>,
    logger: Arc<dyn Logger>,
}

impl Client<ChannelReceiver> {
    /// Create both pipes if needed and open the client's ends
    pub fn connect(
        channels: &ChannelConfig,
        config: &ClientConfig,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, PxError> {
        channels.ensure()?;
        let requests = ChannelSender::open(&channels.request)?;
        let responses = ChannelReceiver::open(&channels.response, channels.mode)?;

        logger.debug(&format!(
            "Sending on {:?}, receiving on {:?}",
            channels.request, channels.response
        ));

        Ok(Self::new(requests, responses, logger).with_backoff(config.backoff.as_ref()))
    }
}

impl<S: ResponseSource> Client<S> {
    /// Create a new client from already opened channel ends
    pub fn new(requests: ChannelSender, responses: S, logger: Arc<dyn Logger>) -> Self {
        Self {
            requests,
            responses,
            backoff: None,
            logger,
        }
    }

    /// Sleep between reconnect attempts instead of retrying at once
    pub fn with_backoff(mut self, backoff: Option<&BackoffConfig>) -> Self {
        self.backoff = backoff.map(ExponentialBackoff::from_config);
        self
    }

    /// Run the prompt loop until the operator quits, input ends or the
    /// server says goodbye
    pub async fn run<I, W>(&mut self, input: I, output: &mut W) -> Result<ExitReason, PxError>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                self.logger.debug("Operator input closed");
                return Ok(ExitReason::EndOfInput);
            };

            if line.starts_with("QUIT") {
                self.logger.debug("QUIT entered");
                return Ok(ExitReason::Quit);
            }

            if line.len() > MAX_LINE_LENGTH {
                writeln!(
                    output,
                    "Command too long ({} bytes, limit {})",
                    line.len(),
                    MAX_LINE_LENGTH
                )?;
                continue;
            }

            self.requests.send_line(&line).await?;
            let response = await_response(
                &mut self.responses,
                self.backoff.as_mut(),
                self.logger.as_ref(),
            )
            .await?;

            writeln!(output, "Server responded: {}", response)?;

            if response.mentions_goodbye() {
                return Ok(ExitReason::Goodbye);
            }
        }
    }
}
