//! Property-based tests for extraction, the frequency store, and ranking.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Extraction never yields empty phrases and is deterministic
//! - The store keeps exactly the newest `capacity` observations, in order
//! - Rankings are sorted, bounded, and account for every observation
//! - Signed events always verify

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use buzzword::models::Token;
use buzzword::nostr::{Keys, UnsignedEvent};
use buzzword::services::PhraseExtractor;
use buzzword::{Error, FrequencyStore, RankingMode, RankingPolicy, compute_ranking};
use proptest::prelude::*;

const LABELS: &[&[&str]] = &[
    &["名詞", "一般"],
    &["名詞", "固有名詞"],
    &["名詞", "サ変接続"],
    &["名詞", "数"],
    &["名詞", "接尾"],
    &["名詞", "代名詞"],
    &["カスタム名詞"],
    &["助詞", "接尾"],
    &["助詞", "格助詞"],
    &["形容詞", "自立"],
    &["記号", "一般"],
    &["記号", "空白"],
    &["動詞", "自立"],
];

fn token() -> impl Strategy<Value = Token> {
    (
        prop::sample::select(vec!["猫", "犬", "通貨", "取引所", "的", "新しい", "#", "(", "ABC", "42", " "]),
        prop::sample::select(LABELS.to_vec()),
    )
        .prop_map(|(surface, labels)| Token::new(surface, labels.iter().copied()))
}

fn phrases() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec!["猫", "犬", "鳥", "Nostr", "nostr", "NOSTR", "鶏", "鷹"]),
        0..200,
    )
    .prop_map(|v| v.into_iter().map(String::from).collect())
}

fn store_with(phrases: &[String]) -> FrequencyStore {
    let store = FrequencyStore::new(1000);
    let now = chrono::Utc::now();
    for phrase in phrases {
        store.insert(phrase.as_str(), now);
    }
    store
}

proptest! {
    /// Property: the extractor never yields an empty phrase.
    #[test]
    fn prop_extracted_phrases_are_non_empty(tokens in prop::collection::vec(token(), 0..40)) {
        for phrase in PhraseExtractor::new(tokens) {
            prop_assert!(!phrase.is_empty());
        }
    }

    /// Property: extraction depends only on the token sequence.
    #[test]
    fn prop_extraction_is_deterministic(tokens in prop::collection::vec(token(), 0..40)) {
        let first: Vec<String> = PhraseExtractor::new(tokens.clone()).collect();
        let second: Vec<String> = PhraseExtractor::new(tokens).collect();
        prop_assert_eq!(first, second);
    }

    /// Property: every extracted phrase is built from surfaces of the input.
    #[test]
    fn prop_phrases_are_made_of_input_surfaces(tokens in prop::collection::vec(token(), 0..40)) {
        let text: String = tokens.iter().map(|t| t.surface.as_str()).collect();
        for phrase in PhraseExtractor::new(tokens.clone()) {
            for c in phrase.chars() {
                prop_assert!(text.contains(c));
            }
        }
    }

    /// Property: the store holds the newest `capacity` insertions in order.
    #[test]
    fn prop_store_is_fifo_bounded(
        capacity in 1usize..50,
        inserts in prop::collection::vec("[a-z]{1,4}", 0..120),
    ) {
        let store = FrequencyStore::new(capacity);
        let now = chrono::Utc::now();
        for phrase in &inserts {
            store.insert(phrase.as_str(), now);
        }

        let kept: Vec<String> = store.snapshot().into_iter().map(|o| o.content).collect();
        let expected: Vec<String> = inserts[inserts.len().saturating_sub(capacity)..].to_vec();
        prop_assert!(store.len() <= capacity);
        prop_assert_eq!(kept, expected);
    }

    /// Property: a full ranking counts every observation exactly once.
    #[test]
    fn prop_full_ranking_accounts_for_every_observation(phrases in phrases()) {
        let store = store_with(&phrases);
        let policy = RankingPolicy { min_groups: 1, ..RankingPolicy::default() };

        match compute_ranking(&store, RankingMode::Full, &policy) {
            Ok(items) => {
                let total: usize = items.iter().map(|i| i.count).sum();
                prop_assert_eq!(total, phrases.len());
            },
            Err(Error::InsufficientData { groups: 0, .. }) => prop_assert!(phrases.is_empty()),
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    /// Property: summary rankings are sorted, supported, and truncated.
    #[test]
    fn prop_summary_ranking_respects_policy(phrases in phrases(), top_n in 1usize..6) {
        let store = store_with(&phrases);
        let policy = RankingPolicy { min_support: 3, min_groups: 1, top_n };

        if let Ok(items) = compute_ranking(&store, RankingMode::Summary, &policy) {
            prop_assert!(items.len() <= top_n);
            prop_assert!(items.iter().all(|i| i.count >= 3));
            for pair in items.windows(2) {
                prop_assert!(
                    pair[0].count > pair[1].count
                        || (pair[0].count == pair[1].count && pair[0].phrase < pair[1].phrase)
                );
            }
        }
    }

    /// Property: ranking never changes the store.
    #[test]
    fn prop_ranking_is_read_only(phrases in phrases()) {
        let store = store_with(&phrases);
        let before = store.snapshot();
        let _ = compute_ranking(&store, RankingMode::Summary, &RankingPolicy::default());
        let _ = compute_ranking(&store, RankingMode::Full, &RankingPolicy::default());
        prop_assert_eq!(store.snapshot(), before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: any signed event verifies under its own id and key.
    #[test]
    fn prop_signed_events_verify(content in "\\PC{0,80}", created_at in 0i64..4_000_000_000) {
        let keys = Keys::parse("67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa")
            .expect("keys");
        let event = UnsignedEvent::new(1, created_at, content).sign(&keys).expect("signed");
        prop_assert!(event.verify().is_ok());
        prop_assert_eq!(event.id.len(), 64);
    }
}
