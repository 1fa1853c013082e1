//! Merged subscription across several relays.
//!
//! One task per relay reads `EVENT` frames and forwards them into a single
//! channel. Events seen from more than one relay are forwarded once
//! (bounded LRU on the event id). Each relay task records whether its
//! connection has failed, which feeds [`ConnectionMonitor::alive_connections`].

use super::event::Event;
use super::message::{ClientMessage, Filter, RelayMessage};
use super::relay::RelayConnection;
use crate::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Capacity of the merged event channel.
const MERGED_CHANNEL_CAPACITY: usize = 256;

/// Number of recent event ids remembered for de-duplication.
const DEFAULT_DEDUPE_CAPACITY: usize = 4096;

/// Reports how many upstream connections are still usable.
pub trait ConnectionMonitor: Send + Sync {
    /// Number of connections that have not failed.
    fn alive_connections(&self) -> usize;
}

/// A live subscription: the merged event stream plus its liveness side channel.
pub struct Subscription {
    /// Inbound events, in arrival order. Closes when every upstream ends.
    pub events: mpsc::Receiver<Event>,
    /// Liveness of the upstream connections.
    pub monitor: Arc<dyn ConnectionMonitor>,
}

/// Source of inbound posts.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Opens a subscription. Upstream readers stop when `shutdown` flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if no subscription could be started.
    async fn subscribe(&self, shutdown: watch::Receiver<bool>) -> Result<Subscription>;
}

/// Per-relay failure flags.
#[derive(Debug)]
struct RelayHealth {
    failed: Vec<AtomicBool>,
}

impl RelayHealth {
    fn new(relays: usize) -> Self {
        Self {
            failed: (0..relays).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    fn mark_failed(&self, index: usize) {
        if let Some(flag) = self.failed.get(index) {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

impl ConnectionMonitor for RelayHealth {
    fn alive_connections(&self) -> usize {
        self.failed
            .iter()
            .filter(|flag| !flag.load(Ordering::Relaxed))
            .count()
    }
}

type SeenIds = Arc<Mutex<LruCache<String, ()>>>;

/// Subscribes to the same filter on several relays and merges the results.
#[derive(Debug, Clone)]
pub struct RelayPool {
    relays: Vec<String>,
    kinds: Vec<u16>,
    connect_timeout: Duration,
    dedupe_capacity: usize,
}

impl RelayPool {
    /// Creates a pool for `relays`, subscribing to events of `kinds`.
    #[must_use]
    pub fn new(relays: Vec<String>, kinds: Vec<u16>, connect_timeout: Duration) -> Self {
        Self {
            relays,
            kinds,
            connect_timeout,
            dedupe_capacity: DEFAULT_DEDUPE_CAPACITY,
        }
    }

    /// Relays this pool subscribes to.
    #[must_use]
    pub fn relays(&self) -> &[String] {
        &self.relays
    }
}

#[async_trait]
impl EventSource for RelayPool {
    async fn subscribe(&self, shutdown: watch::Receiver<bool>) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(MERGED_CHANNEL_CAPACITY);
        let health = Arc::new(RelayHealth::new(self.relays.len()));
        let capacity = NonZeroUsize::new(self.dedupe_capacity).unwrap_or(NonZeroUsize::MIN);
        let seen: SeenIds = Arc::new(Mutex::new(LruCache::new(capacity)));
        let filter = Filter {
            kinds: self.kinds.clone(),
            since: Some(chrono::Utc::now().timestamp()),
        };
        let subscription_id = uuid::Uuid::new_v4().simple().to_string();

        for (index, url) in self.relays.iter().enumerate() {
            let reader = RelayReader {
                url: url.clone(),
                index,
                subscription_id: subscription_id.clone(),
                filter: filter.clone(),
                connect_timeout: self.connect_timeout,
                health: Arc::clone(&health),
                seen: Arc::clone(&seen),
                tx: tx.clone(),
            };
            tokio::spawn(reader.run(shutdown.clone()));
        }

        info!(relays = self.relays.len(), subscription = %subscription_id, "Subscription opened");
        Ok(Subscription {
            events: rx,
            monitor: health,
        })
    }
}

/// Reads one relay's subscription into the merged channel.
struct RelayReader {
    url: String,
    index: usize,
    subscription_id: String,
    filter: Filter,
    connect_timeout: Duration,
    health: Arc<RelayHealth>,
    seen: SeenIds,
    tx: mpsc::Sender<Event>,
}

impl RelayReader {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut connection = match RelayConnection::connect(&self.url, self.connect_timeout).await {
            Ok(connection) => connection,
            Err(e) => {
                self.fail(&e.to_string());
                return;
            },
        };

        let request = ClientMessage::Req {
            subscription_id: &self.subscription_id,
            filter: &self.filter,
        };
        if let Err(e) = connection.send(&request).await {
            self.fail(&e.to_string());
            return;
        }

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                },
                message = connection.next_message() => match message {
                    Ok(Some(RelayMessage::Event { event, .. })) => {
                        if !self.forward(*event).await {
                            break;
                        }
                    },
                    Ok(Some(RelayMessage::Notice(notice))) => {
                        warn!(relay = %self.url, notice = %notice, "Relay notice");
                    },
                    Ok(Some(RelayMessage::Closed { message, .. })) => {
                        self.fail(&format!("subscription closed by relay: {message}"));
                        return;
                    },
                    Ok(Some(_)) => {},
                    Ok(None) => {
                        self.fail("connection closed by relay");
                        return;
                    },
                    Err(e) => {
                        self.fail(&e.to_string());
                        return;
                    },
                },
            }
        }

        // Best effort; the relay drops the subscription with the socket anyway.
        let _ = connection
            .send(&ClientMessage::Close(&self.subscription_id))
            .await;
        connection.close().await;
        debug!(relay = %self.url, "Relay reader stopped");
    }

    /// Verifies, de-duplicates, and forwards one event. Returns `false` once
    /// the receiving side is gone.
    async fn forward(&self, event: Event) -> bool {
        if let Err(e) = event.verify() {
            metrics::counter!("buzzword_events_rejected_total", "reason" => "signature")
                .increment(1);
            debug!(relay = %self.url, error = %e, "Dropping invalid event");
            return true;
        }

        let duplicate = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(event.id.clone(), ())
            .is_some();
        if duplicate {
            return true;
        }

        // Blocks while the channel is full; that is the ingestion throttle.
        self.tx.send(event).await.is_ok()
    }

    fn fail(&self, reason: &str) {
        self.health.mark_failed(self.index);
        metrics::counter!("buzzword_relay_failures_total", "relay" => self.url.clone())
            .increment(1);
        warn!(relay = %self.url, reason = %reason, "Relay connection lost");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_counts_unfailed_connections() {
        let health = RelayHealth::new(3);
        assert_eq!(health.alive_connections(), 3);
        health.mark_failed(1);
        health.mark_failed(1);
        assert_eq!(health.alive_connections(), 2);
        health.mark_failed(7);
        assert_eq!(health.alive_connections(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_relays_are_reported_dead() {
        let pool = RelayPool::new(
            vec!["ws://127.0.0.1:1".to_string()],
            vec![1],
            Duration::from_millis(500),
        );
        let (_tx, shutdown) = watch::channel(false);
        let mut subscription = pool.subscribe(shutdown).await.expect("subscribe");

        // The only reader fails and drops its sender, closing the stream.
        assert!(subscription.events.recv().await.is_none());
        assert_eq!(subscription.monitor.alive_connections(), 0);
    }
}
