//! Configuration management.
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! then environment variables. CLI flags are applied last by the binary.
//!
//! ```toml
//! [relays]
//! publish = ["wss://yabu.me", "wss://nos.lol"]
//! subscribe = ["wss://yabu.me"]
//! timeout_secs = 10
//!
//! [ranking]
//! min_support = 3
//! top_n = 10
//!
//! [filters]
//! script_filter = true
//! extra_bad_words = ["www"]
//! ```

mod ignores;

pub use ignores::IgnoreSet;

use crate::services::RankingPolicy;
use crate::storage::{DEFAULT_CAPACITY, DEFAULT_HORIZON, DEFAULT_SWEEP_INTERVAL};
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Phrase that requests an immediate full ranking.
pub const DEFAULT_TRIGGER_PHRASE: &str = "バズワードランキング";

/// Relays the summary is published to.
pub const DEFAULT_PUBLISH_RELAYS: &[&str] = &[
    "wss://relay-jp.nostr.wirednet.jp",
    "wss://yabu.me",
    "wss://relay.nostr.band",
    "wss://nos.lol",
];

/// Relays the timeline is read from.
pub const DEFAULT_SUBSCRIBE_RELAYS: &[&str] = &["wss://yabu.me", "wss://relay-jp.nostr.wirednet.jp"];

/// Relay endpoints and the per-relay network timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Publish destinations.
    pub publish: Vec<String>,
    /// Subscription sources.
    pub subscribe: Vec<String>,
    /// Connect and acknowledgement timeout per relay.
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            publish: DEFAULT_PUBLISH_RELAYS.iter().map(ToString::to_string).collect(),
            subscribe: DEFAULT_SUBSCRIBE_RELAYS.iter().map(ToString::to_string).collect(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Frequency store sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum live observations.
    pub capacity: usize,
    /// Maximum observation age.
    pub horizon: Duration,
    /// Interval between age sweeps.
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            horizon: DEFAULT_HORIZON,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Timers and limits of the collector and the relay session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Interval between periodic summaries.
    pub summary_interval: Duration,
    /// Interval between health checks.
    pub health_interval: Duration,
    /// Health-check ticks without a post before the session is recycled.
    pub max_health_retries: u32,
    /// Interval between heartbeat pings.
    pub heartbeat_interval: Duration,
    /// Pause before a closed session is reopened.
    pub session_backoff: Duration,
    /// Maximum distance between a trigger post's timestamp and now.
    pub trigger_freshness: Duration,
    /// Capacity of the hand-off queue between session and collector.
    pub queue_capacity: usize,
    /// Phrase that requests an immediate full ranking.
    pub trigger_phrase: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            summary_interval: Duration::from_secs(60 * 60),
            health_interval: Duration::from_secs(10),
            max_health_retries: 60,
            heartbeat_interval: Duration::from_secs(5 * 60),
            session_backoff: Duration::from_secs(5),
            trigger_freshness: Duration::from_secs(10),
            queue_capacity: 10,
            trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
        }
    }
}

/// Ingestion filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Skip whitespace-separated posts without Japanese characters.
    pub script_filter: bool,
    /// Phrases rejected in addition to the built-in stopwords.
    pub extra_bad_words: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            script_filter: true,
            extra_bad_words: Vec::new(),
        }
    }
}

/// Main configuration for buzzword.
#[derive(Debug, Clone)]
pub struct BuzzwordConfig {
    /// Relay endpoints.
    pub relays: RelayConfig,
    /// Frequency store sizing.
    pub store: StoreConfig,
    /// Ranking thresholds.
    pub ranking: RankingPolicy,
    /// Timers and limits.
    pub schedule: ScheduleConfig,
    /// Ingestion filters.
    pub filters: FilterConfig,
    /// Ignore-list path.
    pub ignores_path: PathBuf,
    /// Custom dictionary path.
    pub userdic_path: PathBuf,
    /// Liveness ping URL.
    pub heartbeat_url: Option<String>,
    /// Word-cloud rendering service used for replies.
    pub render_url: Option<String>,
    /// Signing key, `nsec` or hex.
    pub secret_key: Option<SecretString>,
}

impl Default for BuzzwordConfig {
    fn default() -> Self {
        Self {
            relays: RelayConfig::default(),
            store: StoreConfig::default(),
            ranking: RankingPolicy::default(),
            schedule: ScheduleConfig::default(),
            filters: FilterConfig::default(),
            ignores_path: PathBuf::from("ignores.txt"),
            userdic_path: PathBuf::from("userdic.txt"),
            heartbeat_url: None,
            render_url: None,
            secret_key: None,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Relay section.
    pub relays: Option<ConfigFileRelays>,
    /// Store section.
    pub store: Option<ConfigFileStore>,
    /// Ranking section.
    pub ranking: Option<ConfigFileRanking>,
    /// Schedule section.
    pub schedule: Option<ConfigFileSchedule>,
    /// Filters section.
    pub filters: Option<ConfigFileFilters>,
    /// Ignore-list path.
    pub ignores: Option<String>,
    /// Custom dictionary path.
    pub userdic: Option<String>,
    /// Heartbeat URL.
    pub heartbeat_url: Option<String>,
    /// Rendering service URL.
    pub render_url: Option<String>,
}

/// Relays section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRelays {
    /// Publish destinations.
    pub publish: Option<Vec<String>>,
    /// Subscription sources.
    pub subscribe: Option<Vec<String>>,
    /// Per-relay timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Store section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStore {
    /// Maximum live observations.
    pub capacity: Option<usize>,
    /// Maximum observation age in seconds.
    pub horizon_secs: Option<u64>,
    /// Sweep interval in seconds.
    pub sweep_interval_secs: Option<u64>,
}

/// Ranking section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRanking {
    /// Minimum support for summary rankings.
    pub min_support: Option<usize>,
    /// Minimum number of groups.
    pub min_groups: Option<usize>,
    /// Summary length.
    pub top_n: Option<usize>,
}

/// Schedule section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSchedule {
    /// Summary interval in seconds.
    pub summary_interval_secs: Option<u64>,
    /// Health-check interval in seconds.
    pub health_interval_secs: Option<u64>,
    /// Health-check ticks before recycling the session.
    pub max_health_retries: Option<u32>,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: Option<u64>,
    /// Session backoff in seconds.
    pub session_backoff_secs: Option<u64>,
    /// Trigger freshness in seconds.
    pub trigger_freshness_secs: Option<u64>,
    /// Trigger phrase.
    pub trigger_phrase: Option<String>,
}

/// Filters section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFilters {
    /// Mixed-script filter switch.
    pub script_filter: Option<bool>,
    /// Additional stopwords.
    pub extra_bad_words: Option<Vec<String>>,
}

/// Splits a comma-separated relay list, dropping empty entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn set_secs(target: &mut Duration, secs: Option<u64>) {
    if let Some(secs) = secs {
        *target = Duration::from_secs(secs);
    }
}

impl BuzzwordConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_load = |cause: String| Error::ConfigLoad {
            path: path.display().to_string(),
            cause,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| config_load(e.to_string()))?;
        let file: ConfigFile = toml::from_str(&contents).map_err(|e| config_load(e.to_string()))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the platform config directory
    /// (`<config_dir>/buzzword/config.toml`).
    ///
    /// Returns defaults if there is no file or it cannot be parsed.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs.config_dir().join("buzzword").join("config.toml");
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable config file");
                Self::default()
            },
        }
    }

    /// Converts a `ConfigFile` to `BuzzwordConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(relays) = file.relays {
            if let Some(publish) = relays.publish {
                config.relays.publish = publish;
            }
            if let Some(subscribe) = relays.subscribe {
                config.relays.subscribe = subscribe;
            }
            set_secs(&mut config.relays.timeout, relays.timeout_secs);
        }
        if let Some(store) = file.store {
            if let Some(capacity) = store.capacity {
                config.store.capacity = capacity;
            }
            set_secs(&mut config.store.horizon, store.horizon_secs);
            set_secs(&mut config.store.sweep_interval, store.sweep_interval_secs);
        }
        if let Some(ranking) = file.ranking {
            if let Some(v) = ranking.min_support {
                config.ranking.min_support = v;
            }
            if let Some(v) = ranking.min_groups {
                config.ranking.min_groups = v;
            }
            if let Some(v) = ranking.top_n {
                config.ranking.top_n = v;
            }
        }
        if let Some(schedule) = file.schedule {
            set_secs(&mut config.schedule.summary_interval, schedule.summary_interval_secs);
            set_secs(&mut config.schedule.health_interval, schedule.health_interval_secs);
            set_secs(&mut config.schedule.heartbeat_interval, schedule.heartbeat_interval_secs);
            set_secs(&mut config.schedule.session_backoff, schedule.session_backoff_secs);
            set_secs(&mut config.schedule.trigger_freshness, schedule.trigger_freshness_secs);
            if let Some(v) = schedule.max_health_retries {
                config.schedule.max_health_retries = v;
            }
            if let Some(v) = schedule.trigger_phrase {
                config.schedule.trigger_phrase = v;
            }
        }
        if let Some(filters) = file.filters {
            if let Some(v) = filters.script_filter {
                config.filters.script_filter = v;
            }
            if let Some(v) = filters.extra_bad_words {
                config.filters.extra_bad_words = v;
            }
        }
        if let Some(path) = file.ignores {
            config.ignores_path = PathBuf::from(path);
        }
        if let Some(path) = file.userdic {
            config.userdic_path = PathBuf::from(path);
        }
        config.heartbeat_url = file.heartbeat_url;
        config.render_url = file.render_url;

        config
    }

    /// Applies `RELAYS`, `SUBSCRIBE_RELAYS`, `BOT_NSEC`, `HEARTBEAT_URL` and
    /// `RENDER_URL` from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Applies environment overrides read through `lookup`. Empty values are
    /// treated as unset.
    #[must_use]
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(relays) = get("RELAYS") {
            replace_list(&mut self.relays.publish, &relays);
        }
        if let Some(relays) = get("SUBSCRIBE_RELAYS") {
            replace_list(&mut self.relays.subscribe, &relays);
        }
        if let Some(secret) = get("BOT_NSEC") {
            self.secret_key = Some(SecretString::from(secret));
        }
        if let Some(url) = get("HEARTBEAT_URL") {
            self.heartbeat_url = Some(url);
        }
        if let Some(url) = get("RENDER_URL") {
            self.render_url = Some(url);
        }
        self
    }

    /// Sets the ignore-list path.
    #[must_use]
    pub fn with_ignores_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignores_path = path.into();
        self
    }

    /// Sets the custom dictionary path.
    #[must_use]
    pub fn with_userdic_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.userdic_path = path.into();
        self
    }
}

/// Replaces `target` with a comma-separated list unless it parses empty.
fn replace_list(target: &mut Vec<String>, value: &str) {
    let relays = split_list(value);
    if !relays.is_empty() {
        *target = relays;
    }
}
