//! Error types for the session layer.

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Authentication failed — the token was invalid, expired, or rejected
    /// by the [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No session exists for the given player.
    /// This happens when removing a player who was never connected
    /// (or whose session was already removed).
    #[error("session not found for player {0}")]
    NotFound(gridlock_protocol::PlayerId),

    /// The player already has an active session.
    /// A player can only have one session at a time; a second socket
    /// presenting the same identity is rejected.
    #[error("player {0} already has an active session")]
    AlreadyConnected(gridlock_protocol::PlayerId),
}
