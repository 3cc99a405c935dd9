//! Match state: the authoritative data every snapshot carries.
//!
//! The wire shape is locked: camelCase field names, board cells as
//! `null`/`"X"`/`"O"`, player ids as the map keys. Clients rebuild their
//! entire view from each snapshot, so this struct IS the protocol's
//! source of truth.

use std::collections::BTreeMap;
use std::fmt;

use gridlock_protocol::PlayerId;
use serde::{Deserialize, Serialize};

/// A player's marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The opposing marker.
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// The 3×3 board, row-major. Serializes as a flat array of nine
/// `null`/`"X"`/`"O"` cells.
///
/// A non-empty cell never changes except through a full reset — the
/// authority enforces that by only writing through [`Board::set`] after
/// a legality check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([Option<Mark>; 9]);

impl Board {
    /// The mark at `index`, or `None` for an empty cell.
    ///
    /// # Panics
    /// Panics if `index >= 9`; callers validate positions first.
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.0[index]
    }

    /// Places `mark` at `index`.
    pub fn set(&mut self, index: usize, mark: Mark) {
        self.0[index] = Some(mark);
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.0 = [None; 9];
    }

    /// Returns `true` if no cell is occupied.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

/// The full authoritative state of one tic-tac-toe match.
///
/// Broadcast verbatim (as camelCase JSON) on every join, every
/// successful move, every reset, and on a forfeit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    /// The board cells.
    pub board: Board,
    /// Whose turn it is. `None` before anyone joins and after a forfeit.
    pub current_player: Option<PlayerId>,
    /// Role assignment — at most two entries. A `BTreeMap` keeps the
    /// serialized form and "the other player" lookups deterministic.
    pub players: BTreeMap<PlayerId, Mark>,
    /// The winner, when there is one. `None` while the game runs AND for
    /// a draw — `game_over` disambiguates.
    pub winner: Option<PlayerId>,
    /// Set on win, draw, or forfeit. Cleared only by a reset.
    pub game_over: bool,
    /// Moves played so far (0–9).
    pub move_count: u8,
}

impl MatchState {
    /// A fresh, empty match: no players, nobody's turn yet.
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            current_player: None,
            players: BTreeMap::new(),
            winner: None,
            game_over: false,
            move_count: 0,
        }
    }

    /// The marker `player` holds, if seated.
    pub fn mark_of(&self, player: PlayerId) -> Option<Mark> {
        self.players.get(&player).copied()
    }

    /// The opponent of `player`, if one is seated.
    pub fn other_player(&self, player: PlayerId) -> Option<PlayerId> {
        self.players.keys().copied().find(|id| *id != player)
    }

    /// The first unassigned marker: X before O, `None` when both are
    /// taken. Drives seat assignment on join.
    pub fn vacant_mark(&self) -> Option<Mark> {
        if !self.players.values().any(|mark| *mark == Mark::X) {
            Some(Mark::X)
        } else if !self.players.values().any(|mark| *mark == Mark::O) {
            Some(Mark::O)
        } else {
            None
        }
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}
