//! Core text-processing services.
//!
//! - [`normalizer`]: link/tag stripping and the mixed-script pre-filter
//! - [`extraction`]: the phrase-joining state machine and stopwords
//! - [`ranking`]: grouping, thresholding, and ordering of stored phrases
//! - [`ingest`]: the per-post pipeline that ties them to the store

pub mod extraction;
pub mod ingest;
pub mod normalizer;
pub mod ranking;

pub use extraction::{BadWordSet, PhraseExtractor};
pub use ingest::{IngestOutcome, IngestPipeline};
pub use normalizer::{ScriptFilter, contains_japanese, normalize};
pub use ranking::{RankingMode, RankingPolicy, compute_ranking};
