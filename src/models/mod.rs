//! Data models for buzzword.
//!
//! Token classification, phrase observations, and ranking output.

mod observation;
pub mod token;

pub use observation::{Observation, RankedItem};
pub use token::{NounKind, Token, TokenClass};
