//! Integration tests for buzzword: files on disk through to a ranking.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use buzzword::cli;
use buzzword::config::BuzzwordConfig;
use buzzword::nostr::{Event, Keys, KIND_TEXT_NOTE, UnsignedEvent};
use buzzword::services::IngestOutcome;
use buzzword::{Error, RankingMode, RankingPolicy, compute_ranking};
use std::path::Path;
use tempfile::TempDir;

const NPUB: &str = "npub10elfcs4fr0l0r8af98jlmgdh9c8tcxjvz9qkw038js35mp4dma8qzvjptg";
const NPUB_HEX: &str = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";
const SECRET_HEX: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn config_in(dir: &TempDir) -> BuzzwordConfig {
    let ignores = write(
        dir.path(),
        "ignores.txt",
        &format!("# bots\n{NPUB} noisy bot\nnot-an-npub\n"),
    );
    let userdic = write(
        dir.path(),
        "userdic.txt",
        "# surface,segmentation,reading,category\nぼっち・ざ・ろっく,ぼっち ざ ろっく,ボッチザロック,カスタム名詞\n",
    );
    BuzzwordConfig::new()
        .with_ignores_path(ignores)
        .with_userdic_path(userdic)
}

fn post(pubkey: &str, content: &str) -> Event {
    serde_json::from_value(serde_json::json!({
        "id": "00",
        "pubkey": pubkey,
        "created_at": chrono::Utc::now().timestamp(),
        "kind": KIND_TEXT_NOTE,
        "content": content,
    }))
    .expect("event")
}

#[test]
fn test_custom_dictionary_keeps_compound_together() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = cli::build_pipeline(&config_in(&dir)).expect("pipeline");

    let outcome = pipeline.ingest(&post(&"ab".repeat(32), "ぼっち・ざ・ろっく"));

    assert_eq!(outcome, IngestOutcome::Stored { phrases: 1 });
    let stored: Vec<String> = pipeline
        .store()
        .snapshot()
        .into_iter()
        .map(|o| o.content)
        .collect();
    assert_eq!(stored, vec!["ぼっち・ざ・ろっく"]);
}

#[test]
fn test_without_dictionary_hiragana_compound_is_lost() {
    let dir = TempDir::new().expect("tempdir");
    let config = BuzzwordConfig::new()
        .with_ignores_path(dir.path().join("missing-ignores.txt"))
        .with_userdic_path(dir.path().join("missing-userdic.txt"));
    let pipeline = cli::build_pipeline(&config).expect("pipeline");

    pipeline.ingest(&post(&"ab".repeat(32), "ぼっち・ざ・ろっく"));
    assert!(pipeline.store().is_empty());
}

#[test]
fn test_ignored_author_contributes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = cli::build_pipeline(&config_in(&dir)).expect("pipeline");

    assert_eq!(
        pipeline.ingest(&post(NPUB_HEX, "仮想通貨")),
        IngestOutcome::IgnoredAuthor
    );
    assert!(pipeline.store().is_empty());
}

#[test]
fn test_mixed_script_filter_follows_config() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = config_in(&dir);

    let pipeline = cli::build_pipeline(&config).expect("pipeline");
    assert_eq!(
        pipeline.ingest(&post(&"ab".repeat(32), "hello nostr world")),
        IngestOutcome::LowSignal
    );

    config.filters.script_filter = false;
    let pipeline = cli::build_pipeline(&config).expect("pipeline");
    assert!(matches!(
        pipeline.ingest(&post(&"ab".repeat(32), "hello nostr world")),
        IngestOutcome::Stored { .. }
    ));
}

#[test]
fn test_extra_bad_words_are_not_stored() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = config_in(&dir);
    config.filters.extra_bad_words = vec!["GM".to_string()];
    let pipeline = cli::build_pipeline(&config).expect("pipeline");

    pipeline.ingest(&post(&"ab".repeat(32), "GM"));
    assert!(pipeline.store().is_empty());
}

#[test]
fn test_replay_ranks_a_day_of_posts() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = cli::build_pipeline(&config_in(&dir)).expect("pipeline");

    let phrases = ["猫", "犬", "鳥", "鶏", "鷹", "鹿", "麦", "黒", "鼠", "龍"];
    let mut input = String::new();
    for (i, phrase) in phrases.iter().enumerate() {
        for _ in 0..=i {
            input.push_str(&serde_json::to_string(&post(&"cd".repeat(32), phrase)).expect("json"));
            input.push('\n');
        }
    }

    let mut output = Vec::new();
    let summary = cli::replay(&pipeline, &RankingPolicy::default(), input.as_bytes(), &mut output)
        .expect("ranking");

    assert_eq!(summary.items.len(), 10);
    let text = String::from_utf8(output).expect("utf-8");
    let first = text.lines().next().expect("first line");
    assert_eq!(first, "1位: 龍 (10)");
    assert_eq!(text.lines().last(), Some("10位: 猫 (1)"));
}

#[test]
fn test_summary_needs_support_but_full_does_not() {
    let dir = TempDir::new().expect("tempdir");
    let pipeline = cli::build_pipeline(&config_in(&dir)).expect("pipeline");
    for phrase in ["猫", "犬", "鳥", "鶏", "鷹", "鹿", "麦", "黒", "鼠", "龍"] {
        pipeline.ingest(&post(&"ab".repeat(32), phrase));
    }

    let policy = RankingPolicy::default();
    assert!(matches!(
        compute_ranking(pipeline.store(), RankingMode::Summary, &policy),
        Err(Error::InsufficientData { groups: 0, .. })
    ));
    assert_eq!(
        compute_ranking(pipeline.store(), RankingMode::Full, &policy)
            .expect("full ranking")
            .len(),
        10
    );
}

#[test]
fn test_signed_reply_verifies() {
    let keys = Keys::parse(SECRET_HEX).expect("keys");
    let event = UnsignedEvent::new(KIND_TEXT_NOTE, 1_700_000_000, "#バズワードランキング\n\n1位: #猫 (3)\n")
        .sign(&keys)
        .expect("signed");

    assert_eq!(event.pubkey, keys.public_key_hex());
    assert!(event.verify().is_ok());

    let mut tampered = event;
    tampered.content.push('!');
    assert!(tampered.verify().is_err());
}

#[test]
fn test_config_file_layers_under_environment() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        dir.path(),
        "config.toml",
        r#"
heartbeat_url = "https://uptime.example/file"

[relays]
publish = ["wss://file.example"]

[ranking]
top_n = 5
"#,
    );

    let config = BuzzwordConfig::load_from_file(&path)
        .expect("config")
        .with_env_lookup(|name| match name {
            "RELAYS" => Some("wss://env-a.example, wss://env-b.example".to_string()),
            _ => None,
        });

    assert_eq!(config.relays.publish, vec!["wss://env-a.example", "wss://env-b.example"]);
    assert_eq!(config.ranking.top_n, 5);
    assert_eq!(config.heartbeat_url.as_deref(), Some("https://uptime.example/file"));
}

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("bad key".to_string());
    assert!(err.to_string().contains("invalid input"));

    let err = Error::RenderFailed("upload refused".to_string());
    assert_eq!(err.to_string(), "render failed: upload refused");
}
