//! In-memory storage.
//!
//! The only shared mutable state in the process is the windowed phrase
//! store. It lives for the whole process and survives relay session churn,
//! but nothing is persisted across restarts.

mod frequency;

pub use frequency::{
    DEFAULT_CAPACITY, DEFAULT_HORIZON, DEFAULT_SWEEP_INTERVAL, FrequencyStore, SweepResult,
};
