//! Session types: the data structures that represent a player's connection.
//!
//! A "session" is the server's record of a connected player: WHO they are
//! (their [`Presence`]) and WHEN they connected. There is deliberately no
//! disconnected-but-alive state — in Gridlock a dropped connection *is* a
//! leave, and the match treats it as one (see the forfeit rules in the
//! game crate). A player who comes back authenticates again and joins
//! fresh.

use std::time::Instant;

use gridlock_protocol::Presence;

/// A single player's session on the server.
///
/// Created when a player successfully authenticates. Lives exactly as
/// long as the connection does.
#[derive(Debug, Clone)]
pub struct Session {
    /// The authenticated identity this session belongs to.
    pub presence: Presence,

    /// When the session was created.
    ///
    /// `Instant` is Rust's monotonic clock — it always moves forward and
    /// isn't affected by system clock changes, so it's safe for measuring
    /// connection uptime.
    pub connected_at: Instant,
}

impl Session {
    pub fn new(presence: Presence) -> Self {
        Self {
            presence,
            connected_at: Instant::now(),
        }
    }
}
