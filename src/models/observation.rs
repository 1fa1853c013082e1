//! Phrase observations and ranking rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One timestamped occurrence of a phrase.
///
/// Created once per completed phrase per post and owned by the
/// [`FrequencyStore`](crate::storage::FrequencyStore) after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// The phrase as extracted, original casing preserved.
    pub content: String,
    /// Creation time of the post the phrase came from.
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    /// Creates a new observation.
    #[must_use]
    pub fn new(content: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            observed_at,
        }
    }

    /// Returns the case-folded grouping key used by the ranking engine.
    #[must_use]
    pub fn group_key(&self) -> String {
        self.content.to_lowercase()
    }
}

/// A ranked phrase and its occurrence count.
///
/// Derived on every ranking request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankedItem {
    /// Representative phrase (first-seen casing of its group).
    pub phrase: String,
    /// Number of observations in the group.
    pub count: usize,
}

impl RankedItem {
    /// Creates a new ranked item.
    #[must_use]
    pub fn new(phrase: impl Into<String>, count: usize) -> Self {
        Self {
            phrase: phrase.into(),
            count,
        }
    }
}

impl fmt::Display for RankedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.phrase, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_folds_latin_case() {
        let obs = Observation::new("Rust", Utc::now());
        assert_eq!(obs.group_key(), "rust");

        let obs = Observation::new("ノストル", Utc::now());
        assert_eq!(obs.group_key(), "ノストル");
    }

    #[test]
    fn test_ranked_item_display() {
        assert_eq!(RankedItem::new("猫", 5).to_string(), "猫 (5)");
    }
}
