//! The match-channel wire format: opcodes and their payloads.
//!
//! Gameplay traffic rides inside `MatchDataSend`/`MatchData` socket
//! messages as an `(op_code, data)` pair. This module gives those pairs
//! types — clients send a [`ClientCommand`], the authority answers with
//! [`ServerEvent`]s — and validates them at the boundary, so the handler
//! itself only ever sees well-formed commands.

use gridlock_protocol::ProtocolError;
use serde::{Deserialize, Serialize};

use crate::state::MatchState;

/// Server → clients: full state snapshot.
pub const OP_STATE: u8 = 1;
/// Client → server: place a marker.
pub const OP_MOVE: u8 = 2;
/// Client → server: reset a finished game.
pub const OP_RESET: u8 = 3;
/// Server → one client: a rejected action.
pub const OP_ERROR: u8 = 4;

/// Rejection message when the game has already ended.
pub const ERR_GAME_OVER: &str = "Game is over";
/// Rejection message for a move out of turn.
pub const ERR_NOT_YOUR_TURN: &str = "Not your turn";
/// Rejection message for an illegal position (also used for frames the
/// server cannot decode at all).
pub const ERR_INVALID_MOVE: &str = "Invalid move";
/// Join rejection when both seats are taken.
pub const ERR_MATCH_FULL: &str = "Match is full";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MovePayload {
    position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorPayload {
    error: String,
}

/// A decoded gameplay command from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Place the sender's marker at `position` (0–8, row-major).
    ///
    /// Kept as `i32` so out-of-range values survive decoding and are
    /// rejected by the move pipeline instead of the parser.
    Move { position: i32 },
    /// Start a new round on a finished board.
    Reset,
}

impl ClientCommand {
    /// Decodes a match-data frame.
    ///
    /// An unknown opcode or malformed payload is an error — the caller
    /// answers the sender with an opcode-4 rejection, never a crash. The
    /// reset payload is ignored entirely, matching clients that send an
    /// empty body.
    pub fn decode(op_code: u8, data: &[u8]) -> Result<Self, ProtocolError> {
        match op_code {
            OP_MOVE => {
                let payload: MovePayload =
                    serde_json::from_slice(data).map_err(ProtocolError::Decode)?;
                Ok(Self::Move {
                    position: payload.position,
                })
            }
            OP_RESET => Ok(Self::Reset),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown match opcode {other}"
            ))),
        }
    }

    /// The opcode this command travels under.
    pub fn op_code(&self) -> u8 {
        match self {
            Self::Move { .. } => OP_MOVE,
            Self::Reset => OP_RESET,
        }
    }

    /// Encodes the command into an `(op_code, payload)` frame.
    /// Used by clients; the server only decodes.
    pub fn encode(&self) -> Result<(u8, Vec<u8>), ProtocolError> {
        let data = match self {
            Self::Move { position } => serde_json::to_vec(&MovePayload {
                position: *position,
            })
            .map_err(ProtocolError::Encode)?,
            Self::Reset => Vec::new(),
        };
        Ok((self.op_code(), data))
    }
}

/// An outbound event from the authority to clients.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Full authoritative snapshot (opcode 1, broadcast).
    State(MatchState),
    /// A rejection (opcode 4, offender only).
    Error { error: String },
}

impl ServerEvent {
    /// Shorthand for an [`ServerEvent::Error`].
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// The opcode this event travels under.
    pub fn op_code(&self) -> u8 {
        match self {
            Self::State(_) => OP_STATE,
            Self::Error { .. } => OP_ERROR,
        }
    }

    /// Encodes the event into an `(op_code, payload)` frame.
    pub fn encode(&self) -> Result<(u8, Vec<u8>), ProtocolError> {
        let data = match self {
            Self::State(state) => serde_json::to_vec(state).map_err(ProtocolError::Encode)?,
            Self::Error { error } => serde_json::to_vec(&ErrorPayload {
                error: error.clone(),
            })
            .map_err(ProtocolError::Encode)?,
        };
        Ok((self.op_code(), data))
    }

    /// Decodes a server frame. Used by clients; the server only encodes.
    pub fn decode(op_code: u8, data: &[u8]) -> Result<Self, ProtocolError> {
        match op_code {
            OP_STATE => {
                let state: MatchState =
                    serde_json::from_slice(data).map_err(ProtocolError::Decode)?;
                Ok(Self::State(state))
            }
            OP_ERROR => {
                let payload: ErrorPayload =
                    serde_json::from_slice(data).map_err(ProtocolError::Decode)?;
                Ok(Self::Error {
                    error: payload.error,
                })
            }
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown match opcode {other}"
            ))),
        }
    }
}
