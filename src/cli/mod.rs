//! Command implementations behind the `buzzword` binary.
//!
//! | Command | Entry point |
//! |---------|-------------|
//! | `serve` (default) | [`serve`] |
//! | `test` | [`replay`] |

mod replay;
mod serve;

pub use replay::{ReplaySummary, replay};
pub use serve::serve;

use crate::config::{BuzzwordConfig, IgnoreSet};
use crate::services::{BadWordSet, IngestPipeline, ScriptFilter};
use crate::storage::FrequencyStore;
use crate::tokenizer::{ScriptTokenizer, UserDictionary};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Builds the ingest pipeline from configuration.
///
/// A missing ignore list or dictionary is not an error.
///
/// # Errors
///
/// Returns [`crate::Error::ConfigLoad`] if the custom dictionary is malformed.
pub fn build_pipeline(config: &BuzzwordConfig) -> Result<IngestPipeline> {
    let dictionary = UserDictionary::load_or_default(&config.userdic_path)?;
    let ignores = IgnoreSet::load_or_default(&config.ignores_path);
    let bad_words = BadWordSet::default().with_extra(config.filters.extra_bad_words.iter().cloned());
    info!(
        dictionary_entries = dictionary.len(),
        ignored_authors = ignores.len(),
        bad_words = bad_words.len(),
        "Ingest pipeline ready"
    );

    let store = Arc::new(FrequencyStore::new(config.store.capacity));
    Ok(
        IngestPipeline::new(store, Arc::new(ScriptTokenizer::new(dictionary)))
            .with_ignores(ignores)
            .with_bad_words(bad_words)
            .with_script_filter(ScriptFilter::new(config.filters.script_filter)),
    )
}
