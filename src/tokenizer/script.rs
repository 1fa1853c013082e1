//! Script-run tokenizer.
//!
//! Splits text into maximal runs of a single writing script and labels each
//! run the way an IPA-dictionary analyzer labels the dominant word class of
//! that script. Kanji and katakana runs become common nouns, Latin runs
//! proper nouns, digit runs numerals, and hiragana runs particles. Custom
//! dictionary entries take precedence at every position.
//!
//! Whitespace is labelled `記号/空白` as in the IPA dictionary, so it acts
//! as a phrase boundary.

use super::{Tokenizer, UserDictionary};
use crate::Result;
use crate::models::Token;

/// Writing script of a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// CJK ideographs, including `々` and `〆`.
    Kanji,
    /// Full- and half-width katakana, including the prolonged sound mark.
    Katakana,
    /// Hiragana.
    Hiragana,
    /// ASCII, Latin-1 and full-width Latin letters.
    Latin,
    /// ASCII and full-width digits.
    Digit,
    /// Any Unicode whitespace.
    Whitespace,
    /// Punctuation and symbols.
    Symbol,
    /// Everything else (emoji, other scripts).
    Other,
}

impl Script {
    /// Classifies a character.
    #[must_use]
    pub fn of(c: char) -> Self {
        match c {
            '々' | '〆' | '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}' => {
                Self::Kanji
            },
            '\u{30A1}'..='\u{30FA}' | '\u{30FC}'..='\u{30FF}' | '\u{FF66}'..='\u{FF9F}' => {
                Self::Katakana
            },
            '\u{3041}'..='\u{3096}' | 'ゝ' | 'ゞ' => Self::Hiragana,
            '0'..='9' | '\u{FF10}'..='\u{FF19}' => Self::Digit,
            'A'..='Z' | 'a'..='z' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => Self::Latin,
            c if c.is_whitespace() => Self::Whitespace,
            c if c.is_alphabetic() && u32::from(c) < 0x0250 => Self::Latin,
            c if c.is_ascii_punctuation() => Self::Symbol,
            '\u{2000}'..='\u{206F}'
            | '\u{2190}'..='\u{2BFF}'
            | '\u{3000}'..='\u{303F}'
            | '\u{30FB}'
            | '\u{FF01}'..='\u{FF0F}'
            | '\u{FF1A}'..='\u{FF20}'
            | '\u{FF3B}'..='\u{FF40}'
            | '\u{FF5B}'..='\u{FF65}' => Self::Symbol,
            _ => Self::Other,
        }
    }

    /// IPA-style labels assigned to a run of this script.
    #[must_use]
    pub const fn labels(self) -> &'static [&'static str] {
        match self {
            Self::Kanji | Self::Katakana => &["名詞", "一般"],
            Self::Latin => &["名詞", "固有名詞"],
            Self::Digit => &["名詞", "数"],
            Self::Hiragana => &["助詞", "格助詞"],
            Self::Whitespace => &["記号", "空白"],
            Self::Symbol => &["記号", "一般"],
            Self::Other => &["その他"],
        }
    }
}

/// Tokenizer that segments by script boundaries and custom dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct ScriptTokenizer {
    dictionary: UserDictionary,
}

impl ScriptTokenizer {
    /// Creates a tokenizer using the given custom dictionary.
    #[must_use]
    pub const fn new(dictionary: UserDictionary) -> Self {
        Self { dictionary }
    }

    /// Length in bytes of the script run starting at the beginning of `text`.
    fn run_len(&self, text: &str, script: Script) -> usize {
        let mut end = 0;
        for c in text.chars() {
            if end > 0
                && (Script::of(c) != script || self.dictionary.longest_prefix(&text[end..]).is_some())
            {
                break;
            }
            end += c.len_utf8();
        }
        end
    }
}

impl Tokenizer for ScriptTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut rest = text;

        while let Some(first) = rest.chars().next() {
            if let Some(entry) = self.dictionary.longest_prefix(rest) {
                tokens.push(Token::new(entry.surface.as_str(), [entry.category.as_str()]));
                rest = &rest[entry.surface.len()..];
                continue;
            }

            let script = Script::of(first);
            let len = self.run_len(rest, script);
            tokens.push(Token::new(&rest[..len], script.labels().iter().copied()));
            rest = &rest[len..];
        }

        Ok(tokens)
    }
}
