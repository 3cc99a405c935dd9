//! The session manager: tracks all connected players.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Creating sessions when players authenticate
//! - Rejecting a second connection for an already-connected identity
//! - Removing sessions when connections close
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the manager is
//! owned by the server and accessed through a mutex at a higher level.
//! Keeping it simple here avoids hidden locking overhead.

use std::collections::HashMap;

use gridlock_protocol::{PlayerId, Presence};

use crate::{Session, SessionError};

/// Manages all connected player sessions.
///
/// Think of this as a registry — it knows about every player currently
/// connected to the server. Session lifetime equals connection lifetime:
///
/// ```text
/// authenticate() ──→ create() ──→ [connected] ──→ remove()
/// ```
#[derive(Debug, Default)]
pub struct SessionManager {
    /// All active sessions, keyed by player ID.
    ///
    /// We use `PlayerId` as the key because a player can only have
    /// one session at a time.
    sessions: HashMap<PlayerId, Session>,
}

impl SessionManager {
    /// Creates a new, empty session manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for a player after successful authentication.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if the player already
    /// has an active session — two sockets can't share an identity.
    pub fn create(
        &mut self,
        presence: Presence,
    ) -> Result<&Session, SessionError> {
        let player_id = presence.player_id;
        if self.sessions.contains_key(&player_id) {
            return Err(SessionError::AlreadyConnected(player_id));
        }

        tracing::info!(player = %presence, "session created");
        self.sessions.insert(player_id, Session::new(presence));

        // The entry was inserted on the line above, so the lookup can't
        // miss. This is one of the rare places where expect is fine.
        Ok(self.sessions.get(&player_id).expect("just inserted"))
    }

    /// Removes a player's session, returning it.
    ///
    /// Called when the connection closes, for any reason. There is no
    /// grace period: the match layer handles the departure (forfeit etc.)
    /// as soon as the session is gone.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn remove(
        &mut self,
        player_id: PlayerId,
    ) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        tracing::info!(
            player = %session.presence,
            uptime_secs = session.connected_at.elapsed().as_secs(),
            "session closed"
        );
        Ok(session)
    }

    /// Looks up a session by player ID.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// The presence behind a player ID, if connected.
    pub fn presence(&self, player_id: &PlayerId) -> Option<&Presence> {
        self.sessions.get(player_id).map(|s| &s.presence)
    }

    /// Returns the number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
