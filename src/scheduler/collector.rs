//! Collector loop: the single writer of the frequency store.
//!
//! | Event | Action |
//! |-------|--------|
//! | queued post | run the ingest pipeline |
//! | summary timer | rank in summary mode; publish in the background |
//! | sweep timer | evict observations older than the horizon |
//! | queue closed / shutdown | wait for background publishes, then return |

use super::events::{EventLoop, LoopEvent};
use crate::config::StoreConfig;
use crate::nostr::Event;
use crate::publish::Publisher;
use crate::services::{IngestPipeline, RankingMode, RankingPolicy, compute_ranking};
use crate::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Timers owned by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorTimer {
    /// Periodic ranking publish.
    Summary,
    /// Periodic age eviction.
    Sweep,
}

/// Consumes queued posts and drives the periodic summary and sweep.
#[derive(Clone)]
pub struct Collector {
    pipeline: IngestPipeline,
    publisher: Arc<Publisher>,
    policy: RankingPolicy,
    retention: StoreConfig,
    summary_interval: Duration,
}

impl Collector {
    /// Creates a collector with default thresholds and intervals.
    #[must_use]
    pub fn new(pipeline: IngestPipeline, publisher: Arc<Publisher>) -> Self {
        Self {
            pipeline,
            publisher,
            policy: RankingPolicy::default(),
            retention: StoreConfig::default(),
            summary_interval: Duration::from_secs(60 * 60),
        }
    }

    /// Sets the ranking thresholds.
    #[must_use]
    pub const fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the retention horizon and sweep interval.
    #[must_use]
    pub const fn with_retention(mut self, retention: StoreConfig) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the summary interval.
    #[must_use]
    pub const fn with_summary_interval(mut self, interval: Duration) -> Self {
        self.summary_interval = interval;
        self
    }

    /// Runs until `queue` closes or `shutdown` is raised.
    pub async fn run(self, queue: mpsc::Receiver<Event>, shutdown: watch::Receiver<bool>) {
        let mut events = EventLoop::new(queue, shutdown)
            .with_timer(CollectorTimer::Summary, self.summary_interval)
            .with_timer(CollectorTimer::Sweep, self.retention.sweep_interval);
        let mut publishes = JoinSet::new();

        loop {
            match events.next().await {
                LoopEvent::Message(event) => {
                    let outcome = self.pipeline.ingest(&event);
                    debug!(event_id = %event.id, outcome = outcome.as_str(), "Post ingested");
                },
                LoopEvent::Tick(CollectorTimer::Summary) => self.summarize(&mut publishes),
                LoopEvent::Tick(CollectorTimer::Sweep) => {
                    self.pipeline
                        .store()
                        .sweep_older_than(chrono::Utc::now(), self.retention.horizon);
                },
                LoopEvent::Closed | LoopEvent::Shutdown => break,
            }
        }

        let pending = publishes.len();
        if pending > 0 {
            info!(pending, "Waiting for in-flight summaries");
        }
        while publishes.join_next().await.is_some() {}
        debug!("Collector stopped");
    }

    /// Computes the summary ranking and publishes it in the background.
    fn summarize(&self, publishes: &mut JoinSet<()>) {
        let items = match compute_ranking(self.pipeline.store(), RankingMode::Summary, &self.policy)
        {
            Ok(items) => items,
            Err(Error::InsufficientData { groups, required }) => {
                info!(groups, required, "Skipping summary, not enough data");
                return;
            },
            Err(e) => {
                warn!(error = %e, "Summary ranking failed");
                return;
            },
        };

        let publisher = Arc::clone(&self.publisher);
        publishes.spawn(async move {
            if let Err(e) = publisher.publish(&items, None).await {
                warn!(error = %e, "Summary publish failed");
            }
        });
    }
}
