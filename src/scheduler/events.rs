//! Event-loop abstraction.
//!
//! Merges a message channel, any number of named periodic timers, and a
//! shutdown signal into one stream of [`LoopEvent`]s, so each loop body is a
//! single `match`.
//!
//! ```rust,ignore
//! let mut events = EventLoop::new(rx, shutdown)
//!     .with_timer(Timer::Summary, Duration::from_secs(3600))
//!     .with_timer(Timer::Sweep, Duration::from_secs(600));
//! loop {
//!     match events.next().await {
//!         LoopEvent::Message(post) => { /* ... */ },
//!         LoopEvent::Tick(Timer::Summary) => { /* ... */ },
//!         LoopEvent::Tick(Timer::Sweep) => { /* ... */ },
//!         LoopEvent::Closed | LoopEvent::Shutdown => break,
//!     }
//! }
//! ```
//!
//! Shutdown has priority over everything else, and a due timer over pending
//! messages, so a channel that never drains cannot hold back a tick. Each
//! timer fires at most once per period, so messages are not starved either.
//! A timer first fires one full period after the loop is built.

use futures_util::future::select_all;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// One event produced by an [`EventLoop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent<M, T> {
    /// A message arrived.
    Message(M),
    /// The named timer fired.
    Tick(T),
    /// Every sender of the message channel is gone.
    Closed,
    /// The shutdown signal was raised or its sender dropped.
    Shutdown,
}

/// A message channel, named timers, and a shutdown signal merged into one source.
#[derive(Debug)]
pub struct EventLoop<M, T> {
    messages: mpsc::Receiver<M>,
    timers: Vec<(T, Interval)>,
    shutdown: watch::Receiver<bool>,
}

impl<M, T: Copy> EventLoop<M, T> {
    /// Creates a loop over `messages` that stops when `shutdown` becomes `true`.
    #[must_use]
    pub const fn new(messages: mpsc::Receiver<M>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            messages,
            timers: Vec::new(),
            shutdown,
        }
    }

    /// Adds a timer that fires every `period` under `name`.
    ///
    /// Late ticks are delayed rather than bunched together.
    #[must_use]
    pub fn with_timer(mut self, name: T, period: Duration) -> Self {
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timers.push((name, timer));
        self
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> LoopEvent<M, T> {
        loop {
            if *self.shutdown.borrow() {
                return LoopEvent::Shutdown;
            }

            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        return LoopEvent::Shutdown;
                    }
                    // Re-checked at the top of the loop.
                },
                name = next_tick(&mut self.timers) => return LoopEvent::Tick(name),
                message = self.messages.recv() => {
                    return message.map_or(LoopEvent::Closed, LoopEvent::Message);
                },
            }
        }
    }
}

/// Resolves with the name of the first timer to fire; never resolves without timers.
async fn next_tick<T: Copy>(timers: &mut [(T, Interval)]) -> T {
    if timers.is_empty() {
        return std::future::pending().await;
    }
    let ticks = timers.iter_mut().map(|(name, timer)| {
        let name = *name;
        Box::pin(async move {
            timer.tick().await;
            name
        })
    });
    let (name, _index, _rest) = select_all(ticks).await;
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Timer {
        Fast,
        Slow,
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_by_name_in_time_order() {
        let (_tx, rx) = mpsc::channel::<u32>(1);
        let (_stop, shutdown) = watch::channel(false);
        let mut events = EventLoop::new(rx, shutdown)
            .with_timer(Timer::Slow, Duration::from_secs(25))
            .with_timer(Timer::Fast, Duration::from_secs(10));

        let start = Instant::now();
        assert_eq!(events.next().await, LoopEvent::Tick(Timer::Fast));
        assert_eq!(events.next().await, LoopEvent::Tick(Timer::Fast));
        assert_eq!(events.next().await, LoopEvent::Tick(Timer::Slow));
        assert_eq!(events.next().await, LoopEvent::Tick(Timer::Fast));
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_timer_fires_while_channel_stays_full() {
        let (tx, rx) = mpsc::channel(4);
        let (_stop, shutdown) = watch::channel(false);
        let mut events = EventLoop::new(rx, shutdown).with_timer(Timer::Fast, Duration::from_secs(1));
        for i in 0..4 {
            tx.send(i).await.expect("send");
        }
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(events.next().await, LoopEvent::Tick(Timer::Fast));
        let mut next = 4;
        for expected in 0..4 {
            assert_eq!(events.next().await, LoopEvent::Message(expected));
            tx.send(next).await.expect("refill");
            next += 1;
        }

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(events.next().await, LoopEvent::Tick(Timer::Fast));
        assert_eq!(events.next().await, LoopEvent::Message(4));
    }

    #[tokio::test]
    async fn test_messages_then_closed() {
        let (tx, rx) = mpsc::channel(4);
        let (_stop, shutdown) = watch::channel(false);
        let mut events: EventLoop<&str, Timer> = EventLoop::new(rx, shutdown);

        tx.send("a").await.expect("send");
        tx.send("b").await.expect("send");
        drop(tx);

        assert_eq!(events.next().await, LoopEvent::Message("a"));
        assert_eq!(events.next().await, LoopEvent::Message("b"));
        assert_eq!(events.next().await, LoopEvent::Closed);
    }

    #[tokio::test]
    async fn test_shutdown_wins_over_pending_messages() {
        let (tx, rx) = mpsc::channel(4);
        let (stop, shutdown) = watch::channel(false);
        let mut events: EventLoop<u32, Timer> = EventLoop::new(rx, shutdown);

        tx.send(1).await.expect("send");
        stop.send(true).expect("signal");
        assert_eq!(events.next().await, LoopEvent::Shutdown);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_stops_the_loop() {
        let (_tx, rx) = mpsc::channel::<u32>(1);
        let (stop, shutdown) = watch::channel(false);
        let mut events: EventLoop<u32, Timer> = EventLoop::new(rx, shutdown);

        drop(stop);
        assert_eq!(events.next().await, LoopEvent::Shutdown);
    }
}
