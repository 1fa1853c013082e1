//! Text normalization and the mixed-script pre-filter.

use once_cell::sync::Lazy;
use regex::Regex;

// Word boundaries and `\w` are ASCII-only: kana and kanji count as
// non-word, so a link or hashtag glued to Japanese text still matches.

/// Embedded links: a non-whitespace run containing `scheme://`.
static LINK_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?-u:\b)(?-u:\w)+://\S+(?-u:\b)").ok());

/// Hashtags and `nostr:` references.
static TAG_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"((?-u:\B)#\S+|(?-u:\b)nostr:\S+)").ok());

/// Japanese characters: full-width alphanumerics, kana, and common kanji.
static JAPANESE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[０-９Ａ-Ｚａ-ｚぁ-ゖァ-ヾ一-鶴]").ok());

/// Deletes every match of `pattern` from `text`.
fn strip(pattern: &Lazy<Option<Regex>>, text: &str) -> String {
    match pattern.as_ref() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Removes links and cross-reference tags, then trims surrounding whitespace.
///
/// Pure; text without links or tags is only trimmed.
#[must_use]
pub fn normalize(text: &str) -> String {
    let without_links = strip(&LINK_PATTERN, text);
    let without_tags = strip(&TAG_PATTERN, &without_links);
    without_tags.trim().to_string()
}

/// Returns `true` if `text` contains at least one in-scope (Japanese) character.
#[must_use]
pub fn contains_japanese(text: &str) -> bool {
    JAPANESE_PATTERN
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

/// Pre-filter that skips space-separated posts written without any
/// Japanese characters.
///
/// Such posts are mostly in other languages, where the part-of-speech
/// heuristic produces noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptFilter {
    enabled: bool,
}

impl ScriptFilter {
    /// Creates a filter; a disabled filter never rejects.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Returns `true` if the post should be skipped.
    #[must_use]
    pub fn is_low_signal(&self, content: &str) -> bool {
        self.enabled && content.contains([' ', '\t', '\n']) && !contains_japanese(content)
    }
}

impl Default for ScriptFilter {
    fn default() -> Self {
        Self::new(true)
    }
}
