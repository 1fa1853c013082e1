//! Phrase extraction.
//!
//! Morphological segmentation under-joins compound nouns: `仮想通貨取引所`
//! comes back as three nouns. The extractor greedily re-joins adjacent
//! noun, suffix, and particle-suffix runs into one candidate phrase, and
//! treats symbols and any other word class as hard phrase boundaries.
//!
//! # State
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `current` | phrase being accumulated |
//! | `prior_adjective` | last adjective seen, seeds the next noun phrase once |
//! | `seen` | surface forms already consumed in this post |
//!
//! # Transitions
//!
//! | Token class | Effect |
//! |-------------|--------|
//! | repeated surface | skipped entirely |
//! | whitespace | skipped |
//! | symbol | flush |
//! | noun (general, proper, verbal, numeral) without disruptive characters | seed, append |
//! | noun suffix, `current` non-empty | seed, append |
//! | other noun | seed, flush |
//! | custom noun | seed, append |
//! | particle suffix, `current` non-empty | append |
//! | adjective | remember, flush |
//! | anything else | flush |
//!
//! "Seed" means: if `current` is empty and an adjective is remembered, the
//! adjective becomes the start of `current` and is forgotten. End of input
//! is a final flush; flushing an empty accumulator emits nothing.

use crate::models::{NounKind, Token, TokenClass};
use std::collections::HashSet;

/// Characters that keep a noun from joining a phrase.
const DISRUPTIVE_CHARS: [char; 6] = ['(', ')', '〜', '#', '*', '/'];

/// Phrases that are never stored even when extracted.
const DEFAULT_BAD_WORDS: &[&str] = &[
    "ー", "〜", "is", "of", "at", "in", "to", "I", "me", "a", "and", "/", "RE:",
];

/// Exact-match stopword filter applied to extracted phrases.
#[derive(Debug, Clone)]
pub struct BadWordSet {
    words: HashSet<String>,
}

impl BadWordSet {
    /// Creates a set from the given words.
    #[must_use]
    pub fn new<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a copy of the set extended with `extra` words.
    #[must_use]
    pub fn with_extra<S: Into<String>>(mut self, extra: impl IntoIterator<Item = S>) -> Self {
        self.words.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if `phrase` must not be stored.
    #[must_use]
    pub fn rejects(&self, phrase: &str) -> bool {
        phrase.is_empty() || self.words.contains(phrase)
    }

    /// Number of words in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for BadWordSet {
    fn default() -> Self {
        Self::new(DEFAULT_BAD_WORDS.iter().copied())
    }
}

/// Folds one post's token sequence into completed phrases.
///
/// A single-pass iterator: create a new extractor for every post.
#[derive(Debug)]
pub struct PhraseExtractor<I> {
    tokens: I,
    current: String,
    prior_adjective: Option<String>,
    seen: HashSet<String>,
    finished: bool,
}

impl<I> PhraseExtractor<I>
where
    I: Iterator<Item = Token>,
{
    /// Creates an extractor over the tokens of one post.
    pub fn new(tokens: impl IntoIterator<Item = Token, IntoIter = I>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            current: String::new(),
            prior_adjective: None,
            seen: HashSet::new(),
            finished: false,
        }
    }

    /// Takes the accumulated phrase, if any.
    fn flush(&mut self) -> Option<String> {
        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }

    /// Starts a phrase with the remembered adjective when nothing is accumulated.
    ///
    /// The adjective is consumed here: it prefixes only the first noun phrase
    /// that follows it, and later phrases in the same post start bare.
    fn seed(&mut self) {
        if self.current.is_empty() {
            if let Some(adjective) = self.prior_adjective.take() {
                self.current = adjective;
            }
        }
    }

    /// Applies one token. Returns a phrase when the token closes one.
    fn step(&mut self, token: Token) -> Option<String> {
        if !self.seen.insert(token.surface.clone()) {
            return None;
        }

        match token.class() {
            TokenClass::Whitespace => None,
            TokenClass::Noun(kind) => {
                self.seed();
                let joins = if kind.is_content() {
                    !token.surface.contains(DISRUPTIVE_CHARS)
                } else {
                    kind == NounKind::Suffix && !self.current.is_empty()
                };
                if joins {
                    self.current.push_str(&token.surface);
                    None
                } else {
                    self.flush()
                }
            },
            TokenClass::CustomNoun => {
                self.seed();
                self.current.push_str(&token.surface);
                None
            },
            TokenClass::ParticleSuffix if !self.current.is_empty() => {
                self.current.push_str(&token.surface);
                None
            },
            TokenClass::Adjective => {
                self.prior_adjective = Some(token.surface);
                self.flush()
            },
            TokenClass::Symbol | TokenClass::ParticleSuffix | TokenClass::Other => self.flush(),
        }
    }
}

impl<I> Iterator for PhraseExtractor<I>
where
    I: Iterator<Item = Token>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        while let Some(token) = self.tokens.next() {
            if let Some(phrase) = self.step(token) {
                return Some(phrase);
            }
        }
        self.finished = true;
        self.flush()
    }
}
