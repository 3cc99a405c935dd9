//! Authoritative tic-tac-toe on the Gridlock match runtime.
//!
//! The server is the referee: [`TicTacToe`] implements
//! [`gridlock_match::MatchHandler`] and owns every rule — seat
//! assignment, turn order, placement legality, win/draw detection, and
//! forfeit on departure. Clients only ever see [`MatchState`] snapshots
//! and send back intents ([`ClientCommand`]); nothing a client says is
//! trusted until it has run through the authority.
//!
//! Layout:
//! - `state` — the canonical [`MatchState`] and its wire shape
//! - `board` — pure board rules (legality, win lines, draw)
//! - `wire` — match-channel opcodes and payloads
//! - `authority` — the [`TicTacToe`] handler tying it together

mod authority;
mod board;
mod state;
mod wire;

pub use authority::TicTacToe;
pub use state::{Board, Mark, MatchState};
pub use wire::{
    ClientCommand, ServerEvent, ERR_GAME_OVER, ERR_INVALID_MOVE, ERR_MATCH_FULL,
    ERR_NOT_YOUR_TURN, OP_ERROR, OP_MOVE, OP_RESET, OP_STATE,
};
