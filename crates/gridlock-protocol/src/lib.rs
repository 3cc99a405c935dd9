//! Wire protocol for Gridlock.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Types** ([`Envelope`], [`SocketMessage`], [`Presence`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (player identity). It doesn't know about connections or matches —
//! it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session (player context)
//! ```
//!
//! Game-level messages (moves, state snapshots) ride inside
//! [`SocketMessage::MatchDataSend`] / [`SocketMessage::MatchData`] as an
//! opcode plus opaque payload bytes; the game crate owns their meaning.

mod codec;
mod error;
mod types;

// `pub use` makes items from submodules available at the crate root, so
// users write `use gridlock_protocol::Envelope` instead of reaching into
// the module tree.

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Envelope, MatchId, PlayerId, Presence, Recipient, SocketMessage,
};
