//! Relay delivery backend trait and WebSocket implementation.
//!
//! Each delivery opens a fresh connection, sends `["EVENT", <event>]`, and
//! waits for the relay's `["OK", <id>, <accepted>, <message>]`. The whole
//! exchange is bounded by one timeout; there are no retries, since the
//! next periodic summary is the retry.

use crate::nostr::{ClientMessage, Event, RelayConnection, RelayMessage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Trait for relay delivery backends.
///
/// This trait allows for different delivery implementations (WebSocket, mock for testing).
#[async_trait]
pub trait RelayDelivery: Send + Sync {
    /// Delivers a signed event to one relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay is unreachable, rejects the event, or
    /// does not acknowledge it in time.
    async fn deliver(&self, relay: &str, event: &Event) -> Result<()>;
}

/// WebSocket delivery backend.
#[derive(Debug, Clone)]
pub struct WebSocketDelivery {
    timeout: Duration,
}

impl WebSocketDelivery {
    /// Creates a backend that gives up on a relay after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn exchange(relay: &str, event: &Event, connect_timeout: Duration) -> Result<()> {
        let mut connection = RelayConnection::connect(relay, connect_timeout).await?;
        connection.send(&ClientMessage::Event(event)).await?;

        let result = loop {
            match connection.next_message().await {
                Ok(Some(RelayMessage::Ok {
                    event_id,
                    accepted,
                    message,
                })) if event_id == event.id => {
                    break if accepted {
                        Ok(())
                    } else {
                        Err(Error::operation("relay_publish", format!("{relay} rejected: {message}")))
                    };
                },
                Ok(Some(_)) => {},
                Ok(None) => {
                    break Err(Error::operation(
                        "relay_publish",
                        format!("{relay} closed before acknowledging"),
                    ));
                },
                Err(e) => break Err(e),
            }
        };

        connection.close().await;
        result
    }
}

impl Default for WebSocketDelivery {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl RelayDelivery for WebSocketDelivery {
    async fn deliver(&self, relay: &str, event: &Event) -> Result<()> {
        tokio::time::timeout(self.timeout, Self::exchange(relay, event, self.timeout))
            .await
            .map_err(|_| Error::operation("relay_publish", format!("{relay}: timed out")))?
    }
}

/// Mock delivery backend for testing.
#[cfg(test)]
pub struct MockRelayDelivery {
    /// Relays that fail every delivery.
    failing: std::collections::HashSet<String>,
    /// Relays and event ids that were delivered to, in call order.
    pub delivered: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl MockRelayDelivery {
    /// Creates a mock where the listed relays fail.
    pub fn failing_on(relays: &[&str]) -> Self {
        Self {
            failing: relays.iter().map(ToString::to_string).collect(),
            delivered: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of deliveries attempted.
    pub fn delivery_count(&self) -> usize {
        self.delivered.lock().expect("lock").len()
    }
}

#[cfg(test)]
#[async_trait]
impl RelayDelivery for MockRelayDelivery {
    async fn deliver(&self, relay: &str, event: &Event) -> Result<()> {
        self.delivered
            .lock()
            .expect("lock")
            .push((relay.to_string(), event.id.clone()));

        if self.failing.contains(relay) {
            Err(Error::operation("relay_publish", format!("{relay}: refused")))
        } else {
            Ok(())
        }
    }
}
