//! Per-post ingestion pipeline.
//!
//! ```text
//! Event -> author filter -> script filter -> normalize -> tokenize
//!       -> extract phrases -> stopword filter -> FrequencyStore::insert
//! ```
//!
//! Nothing in here can fail the caller: a post that cannot be processed is
//! logged and dropped.

use super::extraction::{BadWordSet, PhraseExtractor};
use super::normalizer::{ScriptFilter, normalize};
use crate::config::IgnoreSet;
use crate::nostr::Event;
use crate::storage::FrequencyStore;
use crate::tokenizer::Tokenizer;
use std::sync::Arc;
use tracing::{debug, trace};

/// What happened to one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The author is on the ignore list.
    IgnoredAuthor,
    /// The mixed-script filter rejected the post.
    LowSignal,
    /// The tokenizer failed; the post was discarded.
    Discarded,
    /// The post was processed.
    Stored {
        /// Phrases inserted into the store.
        phrases: usize,
    },
}

impl IngestOutcome {
    /// Returns the outcome as a static label for metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IgnoredAuthor => "ignored_author",
            Self::LowSignal => "low_signal",
            Self::Discarded => "discarded",
            Self::Stored { .. } => "stored",
        }
    }
}

/// Turns inbound posts into phrase observations.
#[derive(Clone)]
pub struct IngestPipeline {
    store: Arc<FrequencyStore>,
    tokenizer: Arc<dyn Tokenizer>,
    ignores: IgnoreSet,
    bad_words: BadWordSet,
    script_filter: ScriptFilter,
}

impl IngestPipeline {
    /// Creates a pipeline with no ignored authors, the default stopwords,
    /// and the script filter enabled.
    #[must_use]
    pub fn new(store: Arc<FrequencyStore>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            store,
            tokenizer,
            ignores: IgnoreSet::default(),
            bad_words: BadWordSet::default(),
            script_filter: ScriptFilter::default(),
        }
    }

    /// Sets the ignored authors.
    #[must_use]
    pub fn with_ignores(mut self, ignores: IgnoreSet) -> Self {
        self.ignores = ignores;
        self
    }

    /// Sets the stopword filter.
    #[must_use]
    pub fn with_bad_words(mut self, bad_words: BadWordSet) -> Self {
        self.bad_words = bad_words;
        self
    }

    /// Sets the mixed-script filter.
    #[must_use]
    pub const fn with_script_filter(mut self, script_filter: ScriptFilter) -> Self {
        self.script_filter = script_filter;
        self
    }

    /// The store this pipeline writes to.
    #[must_use]
    pub const fn store(&self) -> &Arc<FrequencyStore> {
        &self.store
    }

    /// Runs one post through the pipeline.
    pub fn ingest(&self, event: &Event) -> IngestOutcome {
        let outcome = self.process(event);
        metrics::counter!("buzzword_posts_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }

    fn process(&self, event: &Event) -> IngestOutcome {
        if self.ignores.contains(&event.pubkey) {
            trace!(event_id = %event.id, "Ignored author");
            return IngestOutcome::IgnoredAuthor;
        }
        if self.script_filter.is_low_signal(&event.content) {
            trace!(event_id = %event.id, "Low-signal post");
            return IngestOutcome::LowSignal;
        }

        let text = normalize(&event.content);
        let tokens = match self.tokenizer.tokenize(&text) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!(event_id = %event.id, error = %e, "Tokenizer failed, discarding post");
                return IngestOutcome::Discarded;
            },
        };

        let observed_at = event.created_at_utc();
        let mut phrases = 0;
        for phrase in PhraseExtractor::new(tokens) {
            if self.bad_words.rejects(&phrase) {
                continue;
            }
            self.store.insert(phrase, observed_at);
            phrases += 1;
        }

        IngestOutcome::Stored { phrases }
    }
}
