//! Custom dictionary loading.
//!
//! One entry per line, comma separated:
//!
//! ```text
//! # surface,segmentation,reading,category
//! 日本経済新聞,日本 経済 新聞,ニホン ケイザイ シンブン,カスタム名詞
//! ```
//!
//! A missing file is not an error (the tokenizer simply has no custom
//! entries). A malformed line is: it aborts startup.

use crate::models::token::CUSTOM_NOUN;
use crate::{Error, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

/// Number of comma-separated fields in a dictionary line.
const FIELD_COUNT: usize = 4;

/// A single custom dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// Surface text matched verbatim.
    pub surface: String,
    /// Space-separated segmentation hint.
    pub segmentation: String,
    /// Reading (katakana).
    pub reading: String,
    /// Category label assigned to the token.
    pub category: String,
}

/// Custom dictionary indexed by first character for longest-match lookup.
#[derive(Debug, Clone, Default)]
pub struct UserDictionary {
    by_first_char: HashMap<char, Vec<DictionaryEntry>>,
    len: usize,
}

impl UserDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dictionary file, falling back to an empty dictionary when the
    /// file does not exist or cannot be read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] if the file exists but a line is malformed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No custom dictionary, using built-in segmentation only");
                return Ok(Self::new());
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Custom dictionary unreadable, ignoring it");
                return Ok(Self::new());
            },
        };

        let dictionary = Self::parse(&contents).map_err(|cause| Error::ConfigLoad {
            path: path.display().to_string(),
            cause,
        })?;
        tracing::info!(path = %path.display(), entries = dictionary.len(), "Loaded custom dictionary");
        Ok(dictionary)
    }

    /// Parses dictionary text.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed line.
    pub fn parse(contents: &str) -> std::result::Result<Self, String> {
        let mut dictionary = Self::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < FIELD_COUNT {
                return Err(format!(
                    "line {}: expected {FIELD_COUNT} fields, found {}",
                    index + 1,
                    fields.len()
                ));
            }
            if fields[0].is_empty() {
                return Err(format!("line {}: empty surface", index + 1));
            }
            let category = if fields[3].is_empty() {
                CUSTOM_NOUN
            } else {
                fields[3]
            };
            dictionary.insert(DictionaryEntry {
                surface: fields[0].to_string(),
                segmentation: fields[1].to_string(),
                reading: fields[2].to_string(),
                category: category.to_string(),
            });
        }
        Ok(dictionary)
    }

    /// Adds an entry. Entries sharing a first character are kept longest first.
    pub fn insert(&mut self, entry: DictionaryEntry) {
        let Some(first) = entry.surface.chars().next() else {
            return;
        };
        let bucket = self.by_first_char.entry(first).or_default();
        bucket.push(entry);
        bucket.sort_by(|a, b| b.surface.chars().count().cmp(&a.surface.chars().count()));
        self.len += 1;
    }

    /// Returns the longest entry that `text` starts with.
    #[must_use]
    pub fn longest_prefix(&self, text: &str) -> Option<&DictionaryEntry> {
        let first = text.chars().next()?;
        self.by_first_char
            .get(&first)?
            .iter()
            .find(|entry| text.starts_with(entry.surface.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let dict = UserDictionary::parse(
            "# header\n\n日本経済新聞,日本 経済 新聞,ニホン ケイザイ シンブン,カスタム名詞\n",
        )
        .expect("parse");
        assert_eq!(dict.len(), 1);
        let entry = dict.longest_prefix("日本経済新聞の記事").expect("match");
        assert_eq!(entry.surface, "日本経済新聞");
        assert_eq!(entry.category, "カスタム名詞");
    }

    #[test]
    fn test_longest_match_wins() {
        let dict = UserDictionary::parse("のす,のす,ノス,カスタム名詞\nのすたろう,のす たろう,ノスタロウ,カスタム名詞\n")
            .expect("parse");
        let entry = dict.longest_prefix("のすたろうです").expect("match");
        assert_eq!(entry.surface, "のすたろう");
        assert!(dict.longest_prefix("たろう").is_none());
    }

    #[test]
    fn test_empty_category_defaults_to_custom_noun() {
        let dict = UserDictionary::parse("ぬるぽ,ぬるぽ,ヌルポ,\n").expect("parse");
        assert_eq!(
            dict.longest_prefix("ぬるぽ").map(|e| e.category.as_str()),
            Some(CUSTOM_NOUN)
        );
    }

    #[test]
    fn test_malformed_line_is_rejected() {
        let err = UserDictionary::parse("ok,ok,オーケー,カスタム名詞\nbroken,line\n")
            .expect_err("must fail");
        assert!(err.contains("line 2"));
    }

    #[test]
    fn test_missing_file_falls_back_to_empty() {
        let dict = UserDictionary::load_or_default(Path::new("/nonexistent/userdic.txt"))
            .expect("fallback");
        assert!(dict.is_empty());
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, ",empty,surface,カスタム名詞").expect("write");
        let err = UserDictionary::load_or_default(file.path()).expect_err("must fail");
        assert!(matches!(err, Error::ConfigLoad { .. }));
    }
}
