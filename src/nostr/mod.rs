//! Nostr protocol plumbing.
//!
//! Event model and signing, key encodings, wire frames, a single relay
//! connection, and a multi-relay subscription pool.

mod event;
mod keys;
mod message;
mod pool;
mod relay;

pub use event::{Event, KIND_CHANNEL_MESSAGE, KIND_TEXT_NOTE, Tag, UnsignedEvent, tag};
pub use keys::{Keys, hex_to_npub, npub_to_hex};
pub use message::{ClientMessage, Filter, RelayMessage};
pub use pool::{ConnectionMonitor, EventSource, RelayPool, Subscription};
pub use relay::RelayConnection;
