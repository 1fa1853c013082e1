//! Client and relay wire messages.
//!
//! Every frame is a JSON array whose first element names the message:
//!
//! | Direction | Frame |
//! |-----------|-------|
//! | client → relay | `["EVENT", <event>]`, `["REQ", <sub>, <filter>]`, `["CLOSE", <sub>]` |
//! | relay → client | `["EVENT", <sub>, <event>]`, `["OK", <id>, <bool>, <msg>]`, `["EOSE", <sub>]`, `["NOTICE", <msg>]`, `["CLOSED", <sub>, <msg>]` |

use super::event::Event;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Value, json};

/// Subscription filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
    /// Event kinds to receive.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<u16>,
    /// Only events created at or after this Unix time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
}

/// A frame sent to a relay.
#[derive(Debug, Clone)]
pub enum ClientMessage<'a> {
    /// Publish an event.
    Event(&'a Event),
    /// Open a subscription.
    Req {
        /// Subscription id.
        subscription_id: &'a str,
        /// Filter to apply.
        filter: &'a Filter,
    },
    /// Close a subscription.
    Close(&'a str),
}

impl ClientMessage<'_> {
    /// Serializes the frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let value = match self {
            Self::Event(event) => json!(["EVENT", event]),
            Self::Req {
                subscription_id,
                filter,
            } => json!(["REQ", subscription_id, filter]),
            Self::Close(subscription_id) => json!(["CLOSE", subscription_id]),
        };
        serde_json::to_string(&value).map_err(|e| Error::operation("serialize_frame", e))
    }
}

/// A frame received from a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// An event matching a subscription.
    Event {
        /// Subscription the event belongs to.
        subscription_id: String,
        /// The event.
        event: Box<Event>,
    },
    /// Acknowledgement of a published event.
    Ok {
        /// Id of the published event.
        event_id: String,
        /// Whether the relay stored it.
        accepted: bool,
        /// Human-readable reason.
        message: String,
    },
    /// End of stored events for a subscription.
    EndOfStoredEvents(String),
    /// Human-readable notice.
    Notice(String),
    /// The relay ended a subscription.
    Closed {
        /// Subscription that was closed.
        subscription_id: String,
        /// Human-readable reason.
        message: String,
    },
}

fn string_at(items: &[Value], index: usize) -> String {
    items
        .get(index)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl RelayMessage {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for malformed or unknown frames.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::InvalidInput(format!("relay frame is not JSON: {e}")))?;
        let items = value
            .as_array()
            .ok_or_else(|| Error::InvalidInput("relay frame is not an array".to_string()))?;
        let name = items.first().and_then(Value::as_str).unwrap_or_default();

        match name {
            "EVENT" => {
                let event = items
                    .get(2)
                    .cloned()
                    .ok_or_else(|| Error::InvalidInput("EVENT frame without event".to_string()))?;
                let event: Event = serde_json::from_value(event)
                    .map_err(|e| Error::InvalidInput(format!("malformed event: {e}")))?;
                Ok(Self::Event {
                    subscription_id: string_at(items, 1),
                    event: Box::new(event),
                })
            },
            "OK" => Ok(Self::Ok {
                event_id: string_at(items, 1),
                accepted: items.get(2).and_then(Value::as_bool).unwrap_or(false),
                message: string_at(items, 3),
            }),
            "EOSE" => Ok(Self::EndOfStoredEvents(string_at(items, 1))),
            "NOTICE" => Ok(Self::Notice(string_at(items, 1))),
            "CLOSED" => Ok(Self::Closed {
                subscription_id: string_at(items, 1),
                message: string_at(items, 2),
            }),
            other => Err(Error::InvalidInput(format!("unknown relay frame '{other}'"))),
        }
    }
}
