//! Benchmarks for the per-post pipeline and ranking.
//!
//! Benchmark targets:
//! - tokenize + extract one post: well under 1ms
//! - full ranking over a 1,000-observation store: <5ms

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use buzzword::services::{PhraseExtractor, normalize};
use buzzword::tokenizer::{ScriptTokenizer, Tokenizer};
use buzzword::{FrequencyStore, RankingMode, RankingPolicy, compute_ranking};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const POSTS: &[&str] = &[
    "仮想通貨取引所のニュースを見た https://example.com/news #nostr",
    "今日のランチはラーメンとチャーハン",
    "Nostrクライアントを新しく作ったのでテスト中",
    "新しいMacBookProが届いた、キーボードが最高",
];

fn bench_extraction(c: &mut Criterion) {
    let tokenizer = ScriptTokenizer::default();
    let mut group = c.benchmark_group("extraction");

    for (i, post) in POSTS.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("post", i), post, |b, post| {
            b.iter(|| {
                let tokens = tokenizer.tokenize(&normalize(black_box(post))).unwrap();
                PhraseExtractor::new(tokens).count()
            });
        });
    }
    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");

    for distinct in [10usize, 100, 500] {
        let store = FrequencyStore::new(1000);
        let now = chrono::Utc::now();
        for i in 0..1000 {
            store.insert(format!("語{}", i % distinct), now);
        }
        let policy = RankingPolicy::default();

        group.bench_with_input(BenchmarkId::new("summary", distinct), &store, |b, store| {
            b.iter(|| compute_ranking(black_box(store), RankingMode::Summary, &policy));
        });
        group.bench_with_input(BenchmarkId::new("full", distinct), &store, |b, store| {
            b.iter(|| compute_ranking(black_box(store), RankingMode::Full, &policy));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extraction, bench_ranking);
criterion_main!(benches);
