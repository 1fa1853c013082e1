//! Ranking engine.
//!
//! Turns a snapshot of the frequency store into an ordered list of
//! [`RankedItem`]s. Phrases are grouped by their lowercase fold; the first
//! casing observed in a group is the one reported.

use crate::models::{Observation, RankedItem};
use crate::storage::FrequencyStore;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, instrument};

/// Minimum count a phrase needs to appear in a summary ranking.
pub const DEFAULT_MIN_SUPPORT: usize = 3;

/// Minimum number of ranked groups before anything is published.
pub const DEFAULT_MIN_GROUPS: usize = 10;

/// Length of a summary ranking.
pub const DEFAULT_TOP_N: usize = 10;

/// Which kind of ranking to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankingMode {
    /// Periodic summary: support threshold applied, truncated to the top N.
    Summary,
    /// On-demand ranking: every group, untruncated.
    Full,
}

impl RankingMode {
    /// Returns the mode as a static label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Full => "full",
        }
    }
}

/// Thresholds applied by [`compute_ranking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingPolicy {
    /// Groups with fewer observations are dropped in summary mode.
    pub min_support: usize,
    /// Fewer surviving groups than this yields [`Error::InsufficientData`].
    pub min_groups: usize,
    /// Summary rankings are truncated to this many items.
    pub top_n: usize,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            min_groups: DEFAULT_MIN_GROUPS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Counts observations per lowercase key, keeping the first-seen casing.
///
/// Groups are returned in order of first appearance.
fn group(observations: &[Observation]) -> Vec<RankedItem> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RankedItem> = Vec::new();

    for obs in observations {
        let key = obs.group_key();
        if let Some(&slot) = index.get(&key) {
            groups[slot].count += 1;
        } else {
            index.insert(key, groups.len());
            groups.push(RankedItem::new(obs.content.as_str(), 1));
        }
    }

    groups
}

/// Computes a ranking from the current contents of `store`.
///
/// The store lock is held only while taking the snapshot; grouping and
/// sorting run on the copy, so the store is never modified.
///
/// # Errors
///
/// Returns [`Error::InsufficientData`] if fewer than `policy.min_groups`
/// groups survive filtering.
#[instrument(skip(store, policy), fields(mode = mode.as_str()))]
pub fn compute_ranking(
    store: &FrequencyStore,
    mode: RankingMode,
    policy: &RankingPolicy,
) -> Result<Vec<RankedItem>> {
    let start = Instant::now();
    let snapshot = store.snapshot();

    let mut seen = HashSet::new();
    let mut items: Vec<RankedItem> = group(&snapshot)
        .into_iter()
        .filter(|item| mode == RankingMode::Full || item.count >= policy.min_support)
        .filter(|item| seen.insert(item.phrase.clone()))
        .collect();

    if items.len() < policy.min_groups {
        metrics::counter!(
            "buzzword_rankings_total",
            "mode" => mode.as_str(),
            "status" => "insufficient"
        )
        .increment(1);
        debug!(
            observations = snapshot.len(),
            groups = items.len(),
            required = policy.min_groups,
            "Not enough data to rank"
        );
        return Err(Error::InsufficientData {
            groups: items.len(),
            required: policy.min_groups,
        });
    }

    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.phrase.cmp(&b.phrase)));
    if mode == RankingMode::Summary {
        items.truncate(policy.top_n);
    }

    metrics::counter!(
        "buzzword_rankings_total",
        "mode" => mode.as_str(),
        "status" => "success"
    )
    .increment(1);
    metrics::histogram!("buzzword_ranking_duration_ms", "mode" => mode.as_str())
        .record(start.elapsed().as_secs_f64() * 1000.0);
    debug!(
        observations = snapshot.len(),
        items = items.len(),
        "Ranking computed"
    );

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store_with(counts: &[(&str, usize)]) -> FrequencyStore {
        let store = FrequencyStore::new(1000);
        let now = Utc::now();
        for &(phrase, count) in counts {
            for _ in 0..count {
                store.insert(phrase, now);
            }
        }
        store
    }

    #[test]
    fn test_summary_ranking_orders_by_count_then_phrase() {
        let store = store_with(&[
            ("鳥", 3),
            ("猫", 5),
            ("鶏", 3),
            ("犬", 4),
            ("鷹", 3),
            ("鹿", 3),
            ("麦", 3),
            ("黒", 3),
            ("鼠", 3),
            ("龍", 3),
            ("魚", 2),
        ]);

        let items = compute_ranking(&store, RankingMode::Summary, &RankingPolicy::default())
            .expect("ranking");

        assert_eq!(items.len(), 10);
        assert_eq!(items[0], RankedItem::new("猫", 5));
        assert_eq!(items[1], RankedItem::new("犬", 4));
        assert_eq!(items[2], RankedItem::new("鳥", 3));
        assert!(items.iter().all(|item| item.count >= 3));
        assert!(items.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_summary_ranking_truncates_to_top_n() {
        let phrases: Vec<String> = (0..15).map(|i| format!("word{i:02}")).collect();
        let counts: Vec<(&str, usize)> = phrases.iter().map(|p| (p.as_str(), 3)).collect();
        let store = store_with(&counts);

        let items = compute_ranking(&store, RankingMode::Summary, &RankingPolicy::default())
            .expect("ranking");
        assert_eq!(items.len(), 10);
        assert_eq!(items[0].phrase, "word00");
        assert_eq!(items[9].phrase, "word09");
    }

    #[test]
    fn test_insufficient_data_leaves_store_untouched() {
        let store = store_with(&[("猫", 5), ("犬", 4), ("鳥", 1)]);
        let before = store.snapshot();

        let err = compute_ranking(&store, RankingMode::Summary, &RankingPolicy::default())
            .expect_err("too few groups");
        assert!(matches!(
            err,
            Error::InsufficientData {
                groups: 2,
                required: 10
            }
        ));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_full_ranking_skips_support_and_truncation() {
        let phrases: Vec<String> = (0..12).map(|i| format!("p{i:02}")).collect();
        let counts: Vec<(&str, usize)> = phrases.iter().map(|p| (p.as_str(), 1)).collect();
        let store = store_with(&counts);

        assert!(compute_ranking(&store, RankingMode::Summary, &RankingPolicy::default()).is_err());

        let items =
            compute_ranking(&store, RankingMode::Full, &RankingPolicy::default()).expect("ranking");
        assert_eq!(items.len(), 12);
        assert!(items.iter().all(|item| item.count == 1));
    }

    #[test]
    fn test_grouping_is_case_insensitive_with_first_casing() {
        let store = FrequencyStore::new(100);
        let now = Utc::now();
        store.insert("Nostr", now);
        store.insert("NOSTR", now);
        store.insert("nostr", now);

        let policy = RankingPolicy {
            min_groups: 1,
            ..RankingPolicy::default()
        };
        let items = compute_ranking(&store, RankingMode::Summary, &policy).expect("ranking");
        assert_eq!(items, vec![RankedItem::new("Nostr", 3)]);
    }

    #[test]
    fn test_empty_store_is_insufficient() {
        let store = FrequencyStore::default();
        let err = compute_ranking(&store, RankingMode::Full, &RankingPolicy::default())
            .expect_err("empty");
        assert!(matches!(err, Error::InsufficientData { groups: 0, .. }));
    }
}
