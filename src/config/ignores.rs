//! Author ignore list.
//!
//! One author per line, identified by the first space-separated field as an
//! `npub`; anything after it is a free-form note. Lines starting with `#`
//! are comments.
//!
//! ```text
//! # bots
//! npub1abc... weather bot
//! npub1def...
//! ```

use crate::nostr::npub_to_hex;
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Set of ignored authors, held as lowercase hex public keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    pubkeys: HashSet<String>,
}

impl IgnoreSet {
    /// Creates a set from hex public keys.
    #[must_use]
    pub fn from_hex_keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            pubkeys: keys.into_iter().map(|k| k.into().to_lowercase()).collect(),
        }
    }

    /// Parses ignore-list contents. Entries that are not valid `npub`s are
    /// logged and skipped.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut pubkeys = HashSet::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.starts_with('#') {
                continue;
            }
            let Some(npub) = line.split(' ').next().filter(|field| !field.is_empty()) else {
                continue;
            };
            match npub_to_hex(npub) {
                Ok(hex) => {
                    pubkeys.insert(hex);
                },
                Err(e) => warn!(line = line_no + 1, entry = %npub, error = %e, "Skipping ignore entry"),
            }
        }
        Self { pubkeys }
    }

    /// Reads and parses an ignore-list file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::parse(&contents))
    }

    /// Reads an ignore-list file, falling back to an empty set.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::read(path) {
            Ok(set) => {
                info!(path = %path.display(), authors = set.len(), "Loaded ignore list");
                set
            },
            Err(e) => {
                warn!(error = %e, "Ignore list unavailable, ignoring nobody");
                Self::default()
            },
        }
    }

    /// Returns `true` if posts by `pubkey` (hex) are ignored.
    #[must_use]
    pub fn contains(&self, pubkey: &str) -> bool {
        self.pubkeys.contains(&pubkey.to_lowercase())
    }

    /// Number of ignored authors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pubkeys.len()
    }

    /// Returns `true` if nobody is ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pubkeys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NPUB: &str = "npub10elfcs4fr0l0r8af98jlmgdh9c8tcxjvz9qkw038js35mp4dma8qzvjptg";
    const PUBKEY_HEX: &str = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";

    #[test]
    fn test_parse_skips_comments_and_bad_entries() {
        let contents = format!("# bots\n{NPUB} weather bot\n\nnpub1broken\n");
        let set = IgnoreSet::parse(&contents);
        assert_eq!(set.len(), 1);
        assert!(set.contains(PUBKEY_HEX));
        assert!(set.contains(&PUBKEY_HEX.to_uppercase()));
    }

    #[test]
    fn test_missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let set = IgnoreSet::load_or_default(&dir.path().join("ignores.txt"));
        assert!(set.is_empty());
        assert!(matches!(
            IgnoreSet::read(&dir.path().join("ignores.txt")),
            Err(Error::ConfigLoad { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "{NPUB}").expect("write");
        let set = IgnoreSet::load_or_default(file.path());
        assert!(set.contains(PUBKEY_HEX));
    }
}
