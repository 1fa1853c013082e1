//! Windowed frequency store.
//!
//! A capacity-bounded, insertion-ordered buffer of phrase observations.
//! Two independent mechanisms bound it:
//!
//! - **Capacity eviction** on every insert: once the buffer holds more than
//!   `capacity` entries the oldest one is dropped (FIFO).
//! - **Age eviction** on a periodic sweep: every observation older than the
//!   retention horizon is removed.
//!
//! # Lock Poisoning
//!
//! The store never fails. A poisoned mutex is recovered with
//! [`PoisonError::into_inner`]; the buffer holds plain values and cannot be
//! left half-updated by a panicking reader.

use crate::models::Observation;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Maximum number of live observations.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Maximum age an observation may reach before a sweep removes it.
pub const DEFAULT_HORIZON: Duration = Duration::from_secs(60 * 60);

/// Interval between age sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Converts usize to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn usize_to_f64(value: usize) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}

/// Result of an age sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    /// Observations inspected.
    pub checked: usize,
    /// Observations removed.
    pub removed: usize,
}

/// Mutex-guarded bounded buffer of phrase observations.
///
/// Exactly one task (the collector) writes; readers take a [`snapshot`]
/// and release the lock before sorting or any network call.
///
/// [`snapshot`]: FrequencyStore::snapshot
#[derive(Debug)]
pub struct FrequencyStore {
    entries: Mutex<VecDeque<Observation>>,
    capacity: usize,
}

impl FrequencyStore {
    /// Creates an empty store holding at most `capacity` observations.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Observation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an observation, dropping the oldest entry when over capacity.
    pub fn insert(&self, phrase: impl Into<String>, observed_at: DateTime<Utc>) {
        let observation = Observation::new(phrase, observed_at);
        let (len, evicted) = {
            let mut entries = self.lock();
            entries.push_back(observation);
            let evicted = if entries.len() > self.capacity {
                entries.pop_front()
            } else {
                None
            };
            (entries.len(), evicted)
        };

        metrics::counter!("buzzword_observations_inserted_total").increment(1);
        metrics::gauge!("buzzword_store_size").set(usize_to_f64(len));
        if let Some(evicted) = evicted {
            metrics::counter!("buzzword_observations_evicted_total", "reason" => "capacity")
                .increment(1);
            debug!(phrase = %evicted.content, "Capacity eviction");
        }
    }

    /// Removes every observation whose age at `now` exceeds `horizon`.
    ///
    /// An observation exactly `horizon` old survives; one a nanosecond
    /// older is removed. Timestamps in the future of `now` always survive.
    #[instrument(
        name = "buzzword.store.sweep",
        skip(self),
        fields(horizon_secs = horizon.as_secs())
    )]
    pub fn sweep_older_than(&self, now: DateTime<Utc>, horizon: Duration) -> SweepResult {
        let start = Instant::now();
        let (result, len) = {
            let mut entries = self.lock();
            let checked = entries.len();
            entries.retain(|obs| {
                now.signed_duration_since(obs.observed_at)
                    .to_std()
                    .map_or(true, |age| age <= horizon)
            });
            (
                SweepResult {
                    checked,
                    removed: checked - entries.len(),
                },
                entries.len(),
            )
        };

        metrics::counter!("buzzword_observations_evicted_total", "reason" => "age")
            .increment(result.removed as u64);
        metrics::gauge!("buzzword_store_size").set(usize_to_f64(len));
        metrics::histogram!("buzzword_sweep_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        debug!(
            checked = result.checked,
            removed = result.removed,
            remaining = len,
            "Age sweep completed"
        );
        result
    }

    /// Returns a copy of the current observations in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Observation> {
        self.lock().iter().cloned().collect()
    }

    /// Returns the number of live observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the store holds no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for FrequencyStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
