//! Long-running tasks: the relay session, the collector, and their timers.
//!
//! | Task | Owns | Stops on |
//! |------|------|----------|
//! | [`Supervisor`] | session restarts | process shutdown |
//! | [`Session`] | subscription, health check, heartbeat, trigger replies | drain reason |
//! | [`Collector`] | ingest, periodic summary, age sweep | queue closed |

mod collector;
mod events;
mod heartbeat;
mod session;

pub use collector::{Collector, CollectorTimer};
pub use events::{EventLoop, LoopEvent};
pub use heartbeat::Heartbeat;
pub use session::{DrainReason, Session, SessionState, SessionTimer, Supervisor};
