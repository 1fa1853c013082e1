//! Ranking publisher.
//!
//! Composes the summary post, signs it once, and fans it out to every
//! configured relay concurrently.
//!
//! # Success Policy
//!
//! | Accepted by | Result |
//! |-------------|--------|
//! | zero relays | [`Error::PublishFailed`] |
//! | one or more | [`PublishReport`] listing every relay's outcome |
//!
//! The call returns only after every delivery task has finished, so the
//! report is always complete.

mod compose;
mod delivery;
mod render;

pub use compose::{build_event, compose_content};
pub use delivery::{RelayDelivery, WebSocketDelivery};
pub use render::{HttpImageRenderer, ImageRenderer};

#[cfg(test)]
pub use delivery::MockRelayDelivery;

use crate::config::DEFAULT_TRIGGER_PHRASE;
use crate::models::RankedItem;
use crate::nostr::{Event, Keys};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Outcome of one relay delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Relay URL.
    pub relay: String,
    /// `None` if the relay accepted the event, otherwise the failure.
    pub error: Option<String>,
    /// Time spent on this relay.
    pub duration: Duration,
}

impl DeliveryOutcome {
    /// Returns `true` if the relay accepted the event.
    #[must_use]
    pub const fn accepted(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a publish that met the quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Id of the published event.
    pub event_id: String,
    /// One outcome per configured relay.
    pub outcomes: Vec<DeliveryOutcome>,
}

impl PublishReport {
    /// Number of relays attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of relays that accepted the event.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.accepted()).count()
    }
}

/// Publishes rankings to a fixed set of relays.
#[derive(Clone)]
pub struct Publisher {
    keys: Keys,
    relays: Vec<String>,
    delivery: Arc<dyn RelayDelivery>,
    renderer: Option<Arc<dyn ImageRenderer>>,
    topic: String,
}

impl Publisher {
    /// Creates a publisher signing with `keys` and delivering through `delivery`.
    #[must_use]
    pub fn new(keys: Keys, relays: Vec<String>, delivery: Arc<dyn RelayDelivery>) -> Self {
        Self {
            keys,
            relays,
            delivery,
            renderer: None,
            topic: DEFAULT_TRIGGER_PHRASE.to_string(),
        }
    }

    /// Adds a word-cloud renderer used for replies.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ImageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Sets the topic used for the header hashtag and topic tag.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Configured relays.
    #[must_use]
    pub fn relays(&self) -> &[String] {
        &self.relays
    }

    /// Publishes `items`, as a reply to `reply_to` when given.
    ///
    /// # Errors
    ///
    /// - [`Error::RenderFailed`] if a reply's image cannot be rendered;
    ///   nothing is sent in that case.
    /// - [`Error::PublishFailed`] if no relay accepted the event.
    #[instrument(skip(self, items, reply_to), fields(items = items.len(), reply = reply_to.is_some()))]
    pub async fn publish(
        &self,
        items: &[RankedItem],
        reply_to: Option<&Event>,
    ) -> Result<PublishReport> {
        let image_url = match (&self.renderer, reply_to) {
            (Some(renderer), Some(_)) => {
                let counts: BTreeMap<String, usize> = items
                    .iter()
                    .map(|item| (item.phrase.clone(), item.count))
                    .collect();
                Some(renderer.render(&counts).await?)
            },
            _ => None,
        };

        let content = compose_content(&self.topic, items, image_url.as_deref());
        let now = chrono::Utc::now().timestamp();
        let event = build_event(&self.topic, items, content, reply_to, now).sign(&self.keys)?;

        let outcomes = self.fan_out(Arc::new(event.clone())).await;
        let report = PublishReport {
            event_id: event.id,
            outcomes,
        };

        if report.accepted() == 0 {
            metrics::counter!("buzzword_publish_total", "status" => "failed").increment(1);
            warn!(attempted = report.attempted(), "No relay accepted the ranking");
            return Err(Error::PublishFailed {
                attempted: report.attempted(),
            });
        }

        metrics::counter!("buzzword_publish_total", "status" => "success").increment(1);
        info!(
            event_id = %report.event_id,
            accepted = report.accepted(),
            attempted = report.attempted(),
            "Ranking published"
        );
        Ok(report)
    }

    /// Delivers `event` to every relay concurrently and waits for all of them.
    async fn fan_out(&self, event: Arc<Event>) -> Vec<DeliveryOutcome> {
        let mut tasks = JoinSet::new();
        let mut relay_by_task = HashMap::with_capacity(self.relays.len());
        for relay in &self.relays {
            let url = relay.clone();
            let event = Arc::clone(&event);
            let delivery = Arc::clone(&self.delivery);
            let handle = tasks.spawn(async move {
                let start = Instant::now();
                let result = delivery.deliver(&url, &event).await;
                record_delivery(&url, start.elapsed(), result)
            });
            relay_by_task.insert(handle.id(), relay.clone());
        }

        let mut outcomes = Vec::with_capacity(self.relays.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_id, outcome)) => outcomes.push(outcome),
                Err(e) => {
                    let relay = relay_by_task.remove(&e.id()).unwrap_or_default();
                    warn!(relay = %relay, error = %e, "Delivery task failed");
                    outcomes.push(record_delivery(
                        &relay,
                        Duration::ZERO,
                        Err(Error::operation("relay_publish", e)),
                    ));
                },
            }
        }
        outcomes
    }
}

/// Logs and counts one delivery result.
fn record_delivery(relay: &str, duration: Duration, result: Result<()>) -> DeliveryOutcome {
    metrics::histogram!("buzzword_delivery_duration_ms", "relay" => relay.to_string())
        .record(duration.as_secs_f64() * 1000.0);

    let error = match result {
        Ok(()) => {
            metrics::counter!("buzzword_deliveries_total", "relay" => relay.to_string(), "status" => "accepted")
                .increment(1);
            debug!(relay = %relay, duration_ms = duration.as_millis(), "Relay accepted event");
            None
        },
        Err(e) => {
            metrics::counter!("buzzword_deliveries_total", "relay" => relay.to_string(), "status" => "failed")
                .increment(1);
            warn!(relay = %relay, error = %e, "Relay delivery failed");
            Some(e.to_string())
        },
    };

    DeliveryOutcome {
        relay: relay.to_string(),
        error,
        duration,
    }
}
