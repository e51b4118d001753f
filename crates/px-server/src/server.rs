//! Server loop over the request/response pipes

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use px_core::config::ChannelConfig;
use px_core::{ChannelReceiver, ChannelSender, Logger, PxError};

use crate::dispatcher::Dispatcher;
use crate::session::Session;

/// Serves a single session over one channel pair
pub struct Server {
    channels: ChannelConfig,
    dispatcher: Dispatcher,
    logger: Arc<dyn Logger>,
}

impl Server {
    /// Create a new server
    pub fn new(channels: ChannelConfig, dispatcher: Dispatcher, logger: Arc<dyn Logger>) -> Self {
        Self {
            channels,
            dispatcher,
            logger,
        }
    }

    /// Serve until the session closes or `shutdown` fires
    ///
    /// Both pipe paths are removed on the way out, unless creating them
    /// failed in the first place.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), PxError> {
        self.channels.ensure()?;

        let result = self.serve(&shutdown).await;

        if let Err(e) = self.channels.remove() {
            self.logger.warn(&format!("Failed to remove pipes: {}", e));
        }

        match &result {
            Ok(()) => self.logger.info("Session ended"),
            Err(e) => self.logger.error(&format!("Server stopped: {}", e)),
        }
        result
    }

    async fn serve(&self, shutdown: &CancellationToken) -> Result<(), PxError> {
        let mut receiver = ChannelReceiver::open(&self.channels.request, self.channels.mode)?;
        let mut sender = ChannelSender::open(&self.channels.response)?;
        let mut session = Session::new();

        self.logger.info(&format!(
            "Listening on {:?}, answering on {:?}",
            receiver.path(),
            sender.path()
        ));

        while !session.is_closed() {
            let received = tokio::select! {
                _ = shutdown.cancelled() => {
                    self.logger.info("Shutdown requested");
                    break;
                }
                received = receiver.receive_line() => received,
            };

            let reply = match received {
                Ok(Some(line)) => {
                    self.logger.debug(&format!("Received {} bytes", line.len()));
                    self.dispatcher.dispatch(&mut session, &line).await
                }
                Ok(None) => {
                    self.logger.debug("End of input on request pipe, reopening");
                    receiver.reopen().await?;
                    continue;
                }
                Err(e) if e.is_recoverable() => self.dispatcher.reject(&e),
                Err(e) => return Err(e.into()),
            };

            sender.send_line(&reply.response.to_string()).await?;
            self.logger.debug(&format!(
                "Sent {} (session {})",
                reply.response,
                session.state()
            ));
        }

        Ok(())
    }
}
