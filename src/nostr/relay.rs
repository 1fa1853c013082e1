//! A single WebSocket connection to a relay.

use super::message::{ClientMessage, RelayMessage};
use crate::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open relay connection speaking the client/relay frame protocol.
pub struct RelayConnection {
    url: String,
    stream: Stream,
}

impl RelayConnection {
    /// Opens a connection, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the handshake fails or times out.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let (stream, _response) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| Error::operation("relay_connect", format!("{url}: timed out")))?
            .map_err(|e| Error::operation("relay_connect", format!("{url}: {e}")))?;

        debug!(relay = %url, "Relay connected");
        Ok(Self {
            url: url.to_string(),
            stream,
        })
    }

    /// The relay URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be serialized or written.
    pub async fn send(&mut self, message: &ClientMessage<'_>) -> Result<()> {
        let frame = message.to_json()?;
        trace!(relay = %self.url, frame = %frame, "Sending frame");
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| Error::operation("relay_send", format!("{}: {e}", self.url)))
    }

    /// Waits for the next relay message.
    ///
    /// Non-text frames and unparseable text frames are skipped. Returns
    /// `Ok(None)` once the relay closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying socket fails.
    pub async fn next_message(&mut self) -> Result<Option<RelayMessage>> {
        while let Some(frame) = self.stream.next().await {
            let frame =
                frame.map_err(|e| Error::operation("relay_receive", format!("{}: {e}", self.url)))?;
            match frame {
                Message::Text(text) => match RelayMessage::parse(&text) {
                    Ok(message) => return Ok(Some(message)),
                    Err(e) => {
                        metrics::counter!("buzzword_relay_frames_malformed_total").increment(1);
                        debug!(relay = %self.url, error = %e, "Skipping relay frame");
                    },
                },
                Message::Close(_) => return Ok(None),
                _ => {},
            }
        }
        Ok(None)
    }

    /// Sends a close frame; errors are ignored since the peer may already be gone.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            trace!(relay = %self.url, error = %e, "Close handshake failed");
        }
    }
}
