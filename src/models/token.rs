//! Tokenizer output and its closed classification.
//!
//! The tokenizer hands back free-form category labels (IPA dictionary
//! style, e.g. `名詞` / `一般`). They are mapped once, right after
//! tokenization, into [`TokenClass`] so the phrase extractor matches on
//! enumerated cases instead of string literals.

use serde::{Deserialize, Serialize};

/// Primary label: noun.
pub const NOUN: &str = "名詞";
/// Primary label: entry from the custom dictionary.
pub const CUSTOM_NOUN: &str = "カスタム名詞";
/// Primary label: particle.
pub const PARTICLE: &str = "助詞";
/// Primary label: adjective.
pub const ADJECTIVE: &str = "形容詞";
/// Primary label: symbol / punctuation.
pub const SYMBOL: &str = "記号";
/// Primary label: whitespace.
pub const WHITESPACE: &str = "空白";

/// A token produced by a [`Tokenizer`](crate::tokenizer::Tokenizer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Literal surface text.
    pub surface: String,
    /// Ordered grammatical-category labels; `[0]` is the class, `[1]` the sub-class.
    pub categories: Vec<String>,
}

impl Token {
    /// Creates a token from a surface string and its labels.
    #[must_use]
    pub fn new<S: Into<String>>(
        surface: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            surface: surface.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// Classifies the token by its first two labels.
    #[must_use]
    pub fn class(&self) -> TokenClass {
        let primary = self.categories.first().map(String::as_str);
        let secondary = self.categories.get(1).map_or("", String::as_str);
        TokenClass::from_labels(primary, secondary)
    }
}

/// Noun sub-categories the extractor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NounKind {
    /// `一般`: common noun.
    General,
    /// `固有名詞`: proper noun.
    Proper,
    /// `サ変接続`: verbal noun.
    VerbalNoun,
    /// `数`: numeral.
    Numeral,
    /// `接尾`: bound suffix.
    Suffix,
    /// Any other sub-category (pronoun, adverbial, ...).
    Other,
}

impl NounKind {
    /// Parses a noun sub-category label.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label {
            "一般" => Self::General,
            "固有名詞" => Self::Proper,
            "サ変接続" => Self::VerbalNoun,
            "数" => Self::Numeral,
            "接尾" => Self::Suffix,
            _ => Self::Other,
        }
    }

    /// Whether this kind can open or extend a phrase on its own.
    #[must_use]
    pub const fn is_content(self) -> bool {
        matches!(
            self,
            Self::General | Self::Proper | Self::VerbalNoun | Self::Numeral
        )
    }
}

/// Closed classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// Whitespace, or a token without any labels.
    Whitespace,
    /// Symbol or punctuation; a hard phrase boundary.
    Symbol,
    /// Noun with its sub-category.
    Noun(NounKind),
    /// Entry from the custom dictionary.
    CustomNoun,
    /// Particle whose sub-category is `接尾`.
    ParticleSuffix,
    /// Adjective.
    Adjective,
    /// Anything else.
    Other,
}

impl TokenClass {
    /// Maps raw labels to a class. `None` means the token had no labels.
    #[must_use]
    pub fn from_labels(primary: Option<&str>, secondary: &str) -> Self {
        match primary {
            None | Some(WHITESPACE) => Self::Whitespace,
            Some(SYMBOL) => Self::Symbol,
            Some(NOUN) => Self::Noun(NounKind::parse(secondary)),
            Some(CUSTOM_NOUN) => Self::CustomNoun,
            Some(PARTICLE) if secondary == "接尾" => Self::ParticleSuffix,
            Some(ADJECTIVE) => Self::Adjective,
            Some(_) => Self::Other,
        }
    }
}
