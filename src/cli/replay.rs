//! `test` command: rank a batch of posts read from a stream.

use crate::models::RankedItem;
use crate::nostr::Event;
use crate::services::{IngestOutcome, IngestPipeline, RankingMode, RankingPolicy, compute_ranking};
use crate::{Error, Result};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// Counters from one replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Non-blank input lines.
    pub read: usize,
    /// Lines that were not valid events.
    pub malformed: usize,
    /// Posts that contributed at least one phrase.
    pub stored: usize,
    /// The full ranking that was printed.
    pub items: Vec<RankedItem>,
}

/// Ingests line-delimited JSON events from `input` and writes the full
/// ranking to `output`, one `{rank}位: {phrase} ({count})` line per item.
///
/// # Errors
///
/// - [`Error::InsufficientData`] if too few phrases survived; nothing is written.
/// - [`Error::OperationFailed`] if reading or writing fails.
pub fn replay<R: BufRead, W: Write>(
    pipeline: &IngestPipeline,
    policy: &RankingPolicy,
    input: R,
    output: &mut W,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.map_err(|e| Error::operation("read_input", e))?;
        if line.trim().is_empty() {
            continue;
        }
        summary.read += 1;

        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                summary.malformed += 1;
                warn!(line = index + 1, error = %e, "Skipping malformed event");
                continue;
            },
        };
        let outcome = pipeline.ingest(&event);
        debug!(line = index + 1, outcome = outcome.as_str(), "Replayed post");
        if matches!(outcome, IngestOutcome::Stored { phrases } if phrases > 0) {
            summary.stored += 1;
        }
    }

    summary.items = compute_ranking(pipeline.store(), RankingMode::Full, policy)?;
    for (rank, item) in summary.items.iter().enumerate() {
        writeln!(output, "{}位: {} ({})", rank + 1, item.phrase, item.count)
            .map_err(|e| Error::operation("write_output", e))?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FrequencyStore;
    use crate::tokenizer::ScriptTokenizer;
    use std::sync::Arc;

    fn pipeline() -> IngestPipeline {
        IngestPipeline::new(
            Arc::new(FrequencyStore::default()),
            Arc::new(ScriptTokenizer::default()),
        )
    }

    fn line(content: &str) -> String {
        serde_json::json!({
            "id": "x",
            "pubkey": "ab",
            "created_at": 1_700_000_000,
            "kind": 1,
            "content": content,
        })
        .to_string()
    }

    #[test]
    fn test_prints_full_ranking() {
        let mut input = String::new();
        for (phrase, times) in [("猫", 3), ("犬", 2), ("鳥", 1)] {
            for _ in 0..times {
                input.push_str(&line(phrase));
                input.push('\n');
            }
        }
        input.push_str("not json\n\n");

        let policy = RankingPolicy {
            min_groups: 3,
            ..RankingPolicy::default()
        };
        let mut output = Vec::new();
        let summary = replay(&pipeline(), &policy, input.as_bytes(), &mut output).expect("ranking");

        assert_eq!(summary.read, 7);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.stored, 6);
        assert_eq!(
            String::from_utf8(output).expect("utf-8"),
            "1位: 猫 (3)\n2位: 犬 (2)\n3位: 鳥 (1)\n"
        );
    }

    #[test]
    fn test_too_little_input_is_insufficient_data() {
        let input = format!("{}\n", line("猫"));
        let mut output = Vec::new();
        let err = replay(&pipeline(), &RankingPolicy::default(), input.as_bytes(), &mut output)
            .expect_err("one phrase");

        assert!(matches!(err, Error::InsufficientData { groups: 1, required: 10 }));
        assert!(output.is_empty());
    }
}
