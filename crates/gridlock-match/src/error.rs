//! Error types for the match runtime.

use gridlock_protocol::{MatchId, PlayerId};

/// Errors that can occur during match operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The match does not exist (never created, or already swept).
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// The handler refused the join. The reason is what the requester
    /// should see (e.g. "Match is full").
    #[error("join to match {match_id} rejected: {reason}")]
    JoinRejected { match_id: MatchId, reason: String },

    /// The player is already in a match.
    /// A player can be in at most ONE match at a time.
    #[error("player {0} is already in match {1}")]
    AlreadyJoined(PlayerId, MatchId),

    /// The player is not in any match.
    #[error("player {0} is not in a match")]
    NotInMatch(PlayerId),

    /// The match's command channel is full or its actor has stopped.
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),
}
