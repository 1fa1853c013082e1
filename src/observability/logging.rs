//! Structured logging configuration.

use std::path::PathBuf;

/// Log filter used when neither `BUZZWORD_LOG` nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "info";

/// Log filter used with `--verbose`.
const VERBOSE_FILTER: &str = "debug";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name; unknown names fall back to [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Append-mode log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the configuration from process environment variables.
    #[must_use]
    pub fn from_env(verbose: bool) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), verbose)
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// `--verbose` wins over any filter from the environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, verbose: bool) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let filter = if verbose {
            VERBOSE_FILTER.to_string()
        } else {
            value("BUZZWORD_LOG")
                .or_else(|| value("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_FILTER.to_string())
        };

        Self {
            filter,
            format: value("BUZZWORD_LOG_FORMAT").map_or_else(LogFormat::default, |v| LogFormat::parse(&v)),
            file: value("BUZZWORD_LOG_FILE").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_lookup(lookup(&[]), false);
        assert_eq!(config.filter, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_buzzword_log_wins_over_rust_log() {
        let config = LoggingConfig::from_lookup(
            lookup(&[("BUZZWORD_LOG", "buzzword=trace"), ("RUST_LOG", "warn")]),
            false,
        );
        assert_eq!(config.filter, "buzzword=trace");

        let config = LoggingConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]), false);
        assert_eq!(config.filter, "warn");
    }

    #[test]
    fn test_verbose_forces_debug() {
        let config = LoggingConfig::from_lookup(lookup(&[("BUZZWORD_LOG", "warn")]), true);
        assert_eq!(config.filter, "debug");
    }

    #[test]
    fn test_format_and_file() {
        let config = LoggingConfig::from_lookup(
            lookup(&[("BUZZWORD_LOG_FORMAT", "JSON"), ("BUZZWORD_LOG_FILE", "/tmp/bw.log")]),
            false,
        );
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/bw.log")));
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Pretty);
    }
}
