//! # Buzzword
//!
//! Trending-phrase ranking bot for the Nostr public timeline.
//!
//! Buzzword reads short posts from a set of relays, folds part-of-speech
//! tagged tokens into candidate phrases, keeps a bounded one-hour window of
//! phrase observations, and periodically posts a top-10 ranking back to the
//! network. A post whose content is exactly the trigger phrase gets an
//! immediate full ranking as a reply.
//!
//! ## Pipeline
//!
//! ```text
//! relay pool --> session --(bounded queue)--> collector --> FrequencyStore
//!                  |                              |               |
//!                  | trigger                      | hourly        | snapshot
//!                  v                              v               v
//!              Publisher  <------------------  ranking  <---------+
//!                  |
//!                  +--> relay 1 .. relay N (concurrent, quorum = 1)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use buzzword::services::{RankingMode, RankingPolicy, compute_ranking};
//! use buzzword::storage::FrequencyStore;
//!
//! let store = FrequencyStore::new(1000);
//! store.insert("猫", chrono::Utc::now());
//! let ranking = compute_ranking(&store, RankingMode::Full, &RankingPolicy::default());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod models;
pub mod nostr;
pub mod observability;
pub mod publish;
pub mod scheduler;
pub mod services;
pub mod storage;
pub mod tokenizer;

// Re-exports for convenience
pub use config::BuzzwordConfig;
pub use models::{NounKind, Observation, RankedItem, Token, TokenClass};
pub use publish::Publisher;
pub use services::{IngestPipeline, RankingMode, RankingPolicy, compute_ranking};
pub use storage::FrequencyStore;

/// Error type for buzzword operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Recovery |
/// |---------|-------------|----------|
/// | `InsufficientData` | Fewer ranked groups than the publish minimum | Skip this cycle |
/// | `PublishFailed` | No relay accepted the summary | Next cycle retries |
/// | `RenderFailed` | Image rendering or upload failed | Abort that publish only |
/// | `ConfigLoad` | Ignore list or dictionary unreadable or malformed | Fallback, or fatal for a malformed dictionary |
/// | `InvalidInput` | Bad key material, malformed wire frames | Discard the input |
/// | `OperationFailed` | I/O, WebSocket, or signing failures | Logged by the caller |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Too few distinct phrases survived the support threshold.
    #[error("insufficient data: {groups} ranked groups, {required} required")]
    InsufficientData {
        /// Number of groups that survived filtering.
        groups: usize,
        /// Minimum number of groups required to produce a ranking.
        required: usize,
    },

    /// Zero destinations accepted a published message.
    #[error("publish failed: no relay accepted the event ({attempted} attempted)")]
    PublishFailed {
        /// Number of destinations attempted.
        attempted: usize,
    },

    /// The word-cloud rendering or upload step failed.
    #[error("render failed: {0}")]
    RenderFailed(String),

    /// A startup file could not be loaded.
    ///
    /// Raised when:
    /// - The ignore list cannot be read (callers fall back to an empty set)
    /// - A custom dictionary line is malformed (fatal at startup)
    /// - The TOML configuration file cannot be parsed
    #[error("failed to load '{path}': {cause}")]
    ConfigLoad {
        /// The file that failed to load.
        path: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A signing key is neither `nsec` bech32 nor 64 hex characters
    /// - A relay frame cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for buzzword operations.
pub type Result<T> = std::result::Result<T, Error>;
