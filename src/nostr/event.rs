//! Nostr events: canonical id, signing, and verification.

use super::keys::{Keys, SECP};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use secp256k1::{Message, XOnlyPublicKey, schnorr};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Short text note.
pub const KIND_TEXT_NOTE: u16 = 1;

/// Public channel message.
pub const KIND_CHANNEL_MESSAGE: u16 = 42;

/// A single tag: a name followed by its values, e.g. `["e", <id>]`.
pub type Tag = Vec<String>;

/// Builds a tag from string slices.
#[must_use]
pub fn tag<const N: usize>(parts: [&str; N]) -> Tag {
    parts.iter().map(ToString::to_string).collect()
}

/// A signed event as exchanged with relays.
///
/// Every field defaults when absent so that partially populated events
/// (e.g. replayed from a log) still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Lowercase hex SHA-256 of the canonical serialization.
    #[serde(default)]
    pub id: String,
    /// Lowercase hex x-only public key of the author.
    #[serde(default)]
    pub pubkey: String,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub created_at: i64,
    /// Event kind.
    #[serde(default)]
    pub kind: u16,
    /// Ordered tags.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Text content.
    #[serde(default)]
    pub content: String,
    /// Lowercase hex schnorr signature over `id`.
    #[serde(default)]
    pub sig: String,
}

impl Event {
    /// Creation time as a UTC timestamp; out-of-range values map to the epoch.
    #[must_use]
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_at, 0).unwrap_or_default()
    }

    /// Tags whose name is `e`, in order.
    pub fn event_references(&self) -> impl Iterator<Item = &Tag> {
        self.tags
            .iter()
            .filter(|t| t.first().is_some_and(|name| name == "e"))
    }

    /// Checks that `id` matches the content and that `sig` is a valid
    /// signature by `pubkey`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first check that failed.
    pub fn verify(&self) -> Result<()> {
        let digest = canonical_digest(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;
        if hex::encode(digest) != self.id {
            return Err(Error::InvalidInput(format!("event id mismatch: {}", self.id)));
        }

        let pubkey_bytes = hex::decode(&self.pubkey)
            .map_err(|e| Error::InvalidInput(format!("bad pubkey hex: {e}")))?;
        let pubkey = XOnlyPublicKey::from_slice(&pubkey_bytes)
            .map_err(|e| Error::InvalidInput(format!("bad pubkey: {e}")))?;
        let sig_bytes =
            hex::decode(&self.sig).map_err(|e| Error::InvalidInput(format!("bad sig hex: {e}")))?;
        let signature = schnorr::Signature::from_slice(&sig_bytes)
            .map_err(|e| Error::InvalidInput(format!("bad sig: {e}")))?;

        SECP.verify_schnorr(&signature, &Message::from_digest(digest), &pubkey)
            .map_err(|e| Error::InvalidInput(format!("signature check failed: {e}")))
    }
}

/// An event that has not been signed yet.
///
/// Tags added through [`UnsignedEvent::add_tag`] are de-duplicated by
/// exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    /// Unix timestamp in seconds.
    pub created_at: i64,
    /// Event kind.
    pub kind: u16,
    /// Ordered tags.
    pub tags: Vec<Tag>,
    /// Text content.
    pub content: String,
}

impl UnsignedEvent {
    /// Creates an event with no tags.
    #[must_use]
    pub fn new(kind: u16, created_at: i64, content: impl Into<String>) -> Self {
        Self {
            created_at,
            kind,
            tags: Vec::new(),
            content: content.into(),
        }
    }

    /// Appends `tag` unless an identical tag is already present.
    pub fn add_tag(&mut self, tag: Tag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Computes the id and signs it with `keys`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be serialized.
    pub fn sign(self, keys: &Keys) -> Result<Event> {
        let pubkey = keys.public_key_hex();
        let digest = canonical_digest(&pubkey, self.created_at, self.kind, &self.tags, &self.content)?;
        let signature = SECP.sign_schnorr_no_aux_rand(&Message::from_digest(digest), keys.keypair());

        Ok(Event {
            id: hex::encode(digest),
            pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: hex::encode(signature.serialize()),
        })
    }
}

/// SHA-256 of `[0, pubkey, created_at, kind, tags, content]` serialized as compact JSON.
fn canonical_digest(
    pubkey: &str,
    created_at: i64,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> Result<[u8; 32]> {
    let canonical = serde_json::to_string(&(0, pubkey, created_at, kind, tags, content))
        .map_err(|e| Error::operation("serialize_event", e))?;
    Ok(Sha256::digest(canonical.as_bytes()).into())
}
