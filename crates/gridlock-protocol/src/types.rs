//! Core protocol types for Gridlock's wire format.
//!
//! This module defines every type that travels "on the wire" — the
//! structures that get serialized to bytes, sent over the network, and
//! deserialized on the other side.
//!
//! Think of this as the "language" that the client and server speak.

// We import traits and macros from the `serde` crate. Serde is Rust's standard
// library for **ser**ializing and **de**serializing data. The two key traits:
//   - `Serialize`:   "I can be turned INTO bytes/JSON/etc."
//   - `Deserialize`: "I can be created FROM bytes/JSON/etc."
// The `derive` macro auto-generates these implementations for our types.
use serde::{Deserialize, Serialize};

// We also need `fmt` for implementing Display (human-readable printing).
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// This is a "newtype wrapper" — a common Rust pattern where you wrap a
/// primitive type (here `u64`) in a named struct. Why bother?
///
/// 1. **Type safety**: You can't accidentally pass a `MatchId` where a
///    `PlayerId` is expected, even though both are `u64` underneath.
/// 2. **Readability**: Function signatures like `fn kick(player: PlayerId)`
///    are clearer than `fn kick(player: u64)`.
///
/// The `#[serde(transparent)]` attribute tells serde to serialize this as
/// just the inner `u64`, not as `{ "0": 42 }`. So a PlayerId(42) becomes
/// just `42` in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// Display lets us use `{}` in format strings and logging.
/// `tracing::info!("player {} joined", player_id)` will print "player P-42 joined".
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a match (one game instance between two players).
///
/// Same newtype pattern as `PlayerId`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Presence — an authenticated player
// ---------------------------------------------------------------------------

/// The identity a player carries once authenticated.
///
/// Everything downstream of the handshake — sessions, match joins, game
/// logic — refers to players through a `Presence` or its `player_id`.
/// The `username` is display-only; it never participates in identity
/// comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub player_id: PlayerId,
    pub username: String,
}

impl Presence {
    pub fn new(player_id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            player_id,
            username: username.into(),
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.player_id)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive an outbound match event.
///
/// When game logic processes a player's action, it emits
/// `(Recipient, event)` pairs. This enum tells the runtime WHERE to
/// deliver each one.
///
/// This is a Rust `enum` — but unlike enums in most languages (which are
/// just named integers), Rust enums can carry data in each variant.
/// This is called a "tagged union" or "sum type".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Send to every player in the match.
    All,

    /// Send to one specific player.
    /// Used for validation errors, which only the offender sees.
    Player(PlayerId),

    /// Send to everyone EXCEPT the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// SocketMessage — everything a socket can carry
// ---------------------------------------------------------------------------

/// Every message that can travel over a Gridlock socket, in both
/// directions. The doc comment on each variant notes which side sends it.
///
/// `#[serde(tag = "type")]` is a serde attribute that controls how this enum
/// is represented in JSON. Instead of:
///   `{ "Handshake": { "version": 1 } }`
/// it produces:
///   `{ "type": "Handshake", "version": 1 }`
/// This "internally tagged" format is cleaner and easier to work with in
/// JavaScript/TypeScript on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SocketMessage {
    // -- Connection lifecycle --

    /// Client → Server: "Hello, I want to connect."
    /// `version` is the protocol version so the server can reject
    /// incompatible clients. `token` is the device token the
    /// authenticator turns into a [`Presence`].
    Handshake {
        version: u32,
        token: Option<String>,
    },

    /// Server → Client: "Welcome, you're connected."
    /// Carries the presence the server minted for this connection and
    /// the current `server_time` for clock synchronization.
    HandshakeAck {
        presence: Presence,
        server_time: u64,
    },

    /// Either direction: "I'm disconnecting."
    /// Includes a human-readable reason for logging/debugging.
    Disconnect { reason: String },

    // -- Heartbeat (keep-alive) --

    /// Client → Server: "I'm still here."
    /// Sent every ~5 seconds. `client_time` is the client's local
    /// timestamp so the server can echo it back for RTT calculation.
    Heartbeat { client_time: u64 },

    /// Server → Client: "I see you, here's timing info."
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    // -- RPC (match discovery) --

    /// Client → Server: invoke a named server procedure.
    /// `payload` is a JSON string, opaque to the protocol layer.
    /// Gridlock registers `create_match` and `find_match`.
    Rpc { id: String, payload: String },

    /// Server → Client: the reply to an [`SocketMessage::Rpc`] call,
    /// echoing the same `id`.
    RpcResponse { id: String, payload: String },

    // -- Match membership --

    /// Client → Server: "Put me in this match."
    JoinMatch { match_id: MatchId },

    /// Server → Client: "You're in."
    MatchJoined { match_id: MatchId },

    /// Client → Server: "I'm leaving my match."
    LeaveMatch,

    // -- Match data --

    /// Client → Server: a game message for the sender's current match.
    /// `op_code` selects the kind of message (move, reset, ...) and
    /// `data` is the payload, serialized by the game's codec. Both are
    /// opaque here — only the game crate interprets them.
    MatchDataSend { op_code: u8, data: Vec<u8> },

    /// Server → Client: a game message from the match (state snapshot,
    /// validation error, ...). Mirror of [`SocketMessage::MatchDataSend`].
    MatchData { op_code: u8, data: Vec<u8> },

    // -- Errors --

    /// Server → Client: "Something went wrong."
    /// `code` follows HTTP-style conventions (400 = bad request,
    /// 401 = unauthorized, 404 = not found, 409 = conflict).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every message on the wire is an Envelope.
///
/// Think of it like a postal envelope: metadata on the outside (sequence
/// number, timestamp) and the actual content inside. All traffic rides a
/// single reliable, ordered channel — the WebSocket itself — so there is
/// no per-message delivery mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing sequence number.
    /// Each side (client and server) maintains their own counter.
    /// Used to detect missing or out-of-order messages.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    /// Used for timing and debugging.
    pub timestamp: u64,

    /// The actual message.
    pub msg: SocketMessage,
}

// =========================================================================
// Tests
// =========================================================================
