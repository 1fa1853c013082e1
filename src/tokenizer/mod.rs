//! Tokenizer contract and the built-in script-run tokenizer.
//!
//! Morphological analysis is an external collaborator: anything that turns
//! a normalized string into surface/label pairs can implement
//! [`Tokenizer`]. The crate ships [`ScriptTokenizer`], which segments text
//! into runs of one writing script and consults a [`UserDictionary`] first,
//! so the binary works without a full IPA dictionary.

mod dictionary;
mod script;

pub use dictionary::{DictionaryEntry, UserDictionary};
pub use script::{Script, ScriptTokenizer};

use crate::Result;
use crate::models::Token;

/// Splits normalized text into classified tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenizes `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying analyzer fails; the caller
    /// discards the post.
    fn tokenize(&self, text: &str) -> Result<Vec<Token>>;
}
