//! Relay session and its supervisor.
//!
//! # State Machine
//!
//! ```text
//! Connecting --> Subscribed --+--> Draining(reason) --> Closed
//!      |                      |
//!      +--(subscribe failed)--+
//! ```
//!
//! A session owns one subscription, one collector task, and the health
//! check and heartbeat timers. It drains when:
//!
//! | Reason | Trigger |
//! |--------|---------|
//! | `NoLiveConnections` | a health check finds every upstream failed |
//! | `HealthCheckExhausted` | more than `max_health_retries` checks without a post |
//! | `QueueClosed` | the subscription stream or the collector queue closed |
//! | `SubscribeFailed` | the subscription could not be opened |
//! | `Shutdown` | the process is stopping |
//!
//! Draining stops the upstream readers, lets the collector finish the
//! queued posts, and waits for every in-flight publish. The
//! [`Supervisor`] then starts a fresh session after a fixed backoff, for
//! as long as the process runs. The frequency store outlives sessions.

use super::collector::Collector;
use super::events::{EventLoop, LoopEvent};
use super::heartbeat::Heartbeat;
use crate::config::{ScheduleConfig, StoreConfig};
use crate::nostr::{Event, EventSource};
use crate::publish::Publisher;
use crate::services::{IngestPipeline, RankingMode, RankingPolicy, compute_ranking};
use crate::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrainReason {
    /// Too many health checks passed without a post.
    HealthCheckExhausted,
    /// Every upstream connection failed.
    NoLiveConnections,
    /// The subscription stream or the collector queue closed.
    QueueClosed,
    /// The subscription could not be opened.
    SubscribeFailed,
    /// The process is shutting down.
    Shutdown,
}

impl DrainReason {
    /// Returns the reason as a static label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HealthCheckExhausted => "health_check_exhausted",
            Self::NoLiveConnections => "no_live_connections",
            Self::QueueClosed => "queue_closed",
            Self::SubscribeFailed => "subscribe_failed",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Opening the subscription.
    Connecting,
    /// Receiving posts.
    Subscribed,
    /// Stopping readers and waiting for in-flight work.
    Draining(DrainReason),
    /// Fully stopped.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Subscribed => f.write_str("subscribed"),
            Self::Draining(reason) => write!(f, "draining({})", reason.as_str()),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Timers owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTimer {
    /// Upstream liveness check.
    HealthCheck,
    /// External heartbeat ping.
    Heartbeat,
}

/// One subscription lifetime.
#[derive(Clone)]
pub struct Session {
    source: Arc<dyn EventSource>,
    pipeline: IngestPipeline,
    publisher: Arc<Publisher>,
    heartbeat: Option<Heartbeat>,
    schedule: ScheduleConfig,
    policy: RankingPolicy,
    retention: StoreConfig,
}

/// Mutable state of a running session.
struct Running {
    state: SessionState,
    retries: u32,
    publishes: JoinSet<()>,
}

impl Running {
    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
    }
}

impl Session {
    /// Creates a session with default timers and thresholds.
    #[must_use]
    pub fn new(
        source: Arc<dyn EventSource>,
        pipeline: IngestPipeline,
        publisher: Arc<Publisher>,
    ) -> Self {
        Self {
            source,
            pipeline,
            publisher,
            heartbeat: None,
            schedule: ScheduleConfig::default(),
            policy: RankingPolicy::default(),
            retention: StoreConfig::default(),
        }
    }

    /// Sets timers, limits, and the trigger phrase.
    #[must_use]
    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
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

    /// Enables the heartbeat ping.
    #[must_use]
    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// Returns `true` if `event` asks for an immediate ranking at `now`.
    #[must_use]
    pub fn is_trigger(&self, event: &Event, now: i64) -> bool {
        event.content.trim() == self.schedule.trigger_phrase
            && now.abs_diff(event.created_at) < self.schedule.trigger_freshness.as_secs()
    }

    /// Runs one session to completion and reports why it stopped.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> DrainReason {
        let mut running = Running {
            state: SessionState::Connecting,
            retries: 0,
            publishes: JoinSet::new(),
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let subscription = match self.source.subscribe(stop_rx.clone()).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "Subscription failed");
                running.transition(SessionState::Draining(DrainReason::SubscribeFailed));
                running.transition(SessionState::Closed);
                return DrainReason::SubscribeFailed;
            },
        };
        let monitor = subscription.monitor;

        let (queue_tx, queue_rx) = mpsc::channel(self.schedule.queue_capacity.max(1));
        let collector = Collector::new(self.pipeline.clone(), Arc::clone(&self.publisher))
            .with_policy(self.policy)
            .with_retention(self.retention)
            .with_summary_interval(self.schedule.summary_interval);
        let collector = tokio::spawn(collector.run(queue_rx, stop_rx));

        let mut events = EventLoop::new(subscription.events, shutdown)
            .with_timer(SessionTimer::HealthCheck, self.schedule.health_interval);
        if self.heartbeat.is_some() {
            events = events.with_timer(SessionTimer::Heartbeat, self.schedule.heartbeat_interval);
        }

        running.transition(SessionState::Subscribed);
        info!("Session subscribed");

        let reason = loop {
            match events.next().await {
                LoopEvent::Message(event) => {
                    if self.is_trigger(&event, chrono::Utc::now().timestamp()) {
                        self.reply_with_ranking(event, &mut running.publishes);
                        continue;
                    }
                    if queue_tx.send(event).await.is_err() {
                        break DrainReason::QueueClosed;
                    }
                    running.retries = 0;
                },
                LoopEvent::Tick(SessionTimer::HealthCheck) => {
                    let alive = monitor.alive_connections();
                    metrics::counter!("buzzword_health_checks_total").increment(1);
                    if alive == 0 {
                        break DrainReason::NoLiveConnections;
                    }
                    running.retries += 1;
                    debug!(retries = running.retries, alive, "Health check");
                    if running.retries > self.schedule.max_health_retries {
                        break DrainReason::HealthCheckExhausted;
                    }
                },
                LoopEvent::Tick(SessionTimer::Heartbeat) => {
                    if let Some(heartbeat) = &self.heartbeat {
                        heartbeat.ping();
                    }
                },
                LoopEvent::Closed => break DrainReason::QueueClosed,
                LoopEvent::Shutdown => break DrainReason::Shutdown,
            }
        };

        running.transition(SessionState::Draining(reason));
        info!(reason = reason.as_str(), "Session draining");

        drop(events);
        drop(queue_tx);
        // The collector ingests what is still queued, then sees the close.
        if let Err(e) = collector.await {
            warn!(error = %e, "Collector task failed");
        }
        // Receivers may already be gone.
        let _ = stop_tx.send(true);
        while running.publishes.join_next().await.is_some() {}

        running.transition(SessionState::Closed);
        metrics::counter!("buzzword_sessions_closed_total", "reason" => reason.as_str())
            .increment(1);
        reason
    }

    /// Computes a full ranking and publishes it as a reply to `target`.
    fn reply_with_ranking(&self, target: Event, publishes: &mut JoinSet<()>) {
        info!(event_id = %target.id, "Ranking requested");
        let items = match compute_ranking(self.pipeline.store(), RankingMode::Full, &self.policy) {
            Ok(items) => items,
            Err(Error::InsufficientData { groups, required }) => {
                info!(groups, required, "Not enough data to answer ranking request");
                return;
            },
            Err(e) => {
                warn!(error = %e, "Ranking request failed");
                return;
            },
        };

        let publisher = Arc::clone(&self.publisher);
        publishes.spawn(async move {
            if let Err(e) = publisher.publish(&items, Some(&target)).await {
                warn!(error = %e, event_id = %target.id, "Ranking reply failed");
            }
        });
    }
}

/// Restarts sessions forever, pausing between them.
#[derive(Clone)]
pub struct Supervisor {
    session: Session,
    backoff: Duration,
}

impl Supervisor {
    /// Creates a supervisor that waits `backoff` between sessions.
    #[must_use]
    pub const fn new(session: Session, backoff: Duration) -> Self {
        Self { session, backoff }
    }

    /// Runs sessions until `shutdown` is raised.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut generation: u64 = 0;
        loop {
            generation += 1;
            info!(generation, "Starting session");
            let reason = self.session.run(shutdown.clone()).await;
            if reason == DrainReason::Shutdown || *shutdown.borrow() {
                break;
            }

            metrics::counter!("buzzword_session_restarts_total").increment(1);
            info!(
                reason = reason.as_str(),
                backoff_secs = self.backoff.as_secs(),
                "Session closed, restarting after backoff"
            );
            tokio::select! {
                () = tokio::time::sleep(self.backoff) => {},
                Ok(()) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                },
            }
        }
        info!("Supervisor stopped");
    }
}
