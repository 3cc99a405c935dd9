//! Match registry: creates, tracks, and routes players to match actors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gridlock_protocol::{MatchId, PlayerId, Presence};

use crate::actor::spawn_match;
use crate::{EngineError, EventSender, LabelQuery, MatchHandle, MatchHandler, MatchInfo};

/// Counter for generating unique match IDs.
static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Manages all active matches and tracks which player is in which match.
///
/// This is the entry point for match operations from higher layers
/// (connection handlers, the RPC surface). It is the only cross-match
/// shared resource; actors never touch each other.
pub struct MatchRegistry<H: MatchHandler> {
    /// Active matches, keyed by match ID.
    matches: HashMap<MatchId, MatchHandle<H>>,

    /// Maps each player to the match they're currently in.
    /// A player can be in at most ONE match at a time (key invariant).
    player_matches: HashMap<PlayerId, MatchId>,
}

impl<H: MatchHandler> MatchRegistry<H> {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            matches: HashMap::new(),
            player_matches: HashMap::new(),
        }
    }

    /// Creates a new match and returns its ID.
    pub fn create(&mut self) -> MatchId {
        let match_id = MatchId(NEXT_MATCH_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_match::<H>(match_id);
        self.matches.insert(match_id, handle);
        tracing::info!(%match_id, "match created");
        match_id
    }

    /// Adds a player to a match.
    ///
    /// Enforces the "one match at a time" invariant, then defers to the
    /// actor (and through it the handler's join policy).
    pub async fn join(
        &mut self,
        presence: Presence,
        match_id: MatchId,
        sender: EventSender<H>,
    ) -> Result<(), EngineError> {
        let player_id = presence.player_id;
        if let Some(current) = self.player_matches.get(&player_id) {
            return Err(EngineError::AlreadyJoined(player_id, *current));
        }

        let handle = self
            .matches
            .get(&match_id)
            .ok_or(EngineError::NotFound(match_id))?;

        handle.join(presence, sender).await?;
        self.player_matches.insert(player_id, match_id);
        Ok(())
    }

    /// Removes a player from their current match.
    ///
    /// Returns the match they left. The player-to-match index entry is
    /// removed even if the actor has already stopped — a dead match must
    /// not trap its players.
    pub async fn leave(&mut self, player_id: PlayerId) -> Result<MatchId, EngineError> {
        let match_id = self
            .player_matches
            .get(&player_id)
            .copied()
            .ok_or(EngineError::NotInMatch(player_id))?;

        if let Some(handle) = self.matches.get(&match_id) {
            if let Err(error) = handle.leave(player_id).await {
                tracing::warn!(
                    %player_id,
                    %match_id,
                    %error,
                    "leave did not reach the match actor"
                );
            }
        }

        self.player_matches.remove(&player_id);
        Ok(match_id)
    }

    /// Routes a gameplay command from a player to their current match.
    pub async fn send_data(
        &self,
        player_id: PlayerId,
        command: H::Command,
    ) -> Result<(), EngineError> {
        let match_id = self
            .player_matches
            .get(&player_id)
            .ok_or(EngineError::NotInMatch(player_id))?;

        let handle = self
            .matches
            .get(match_id)
            .ok_or(EngineError::NotFound(*match_id))?;

        handle.send_data(player_id, command).await
    }

    /// Returns info about a specific match.
    pub async fn info(&self, match_id: MatchId) -> Result<MatchInfo, EngineError> {
        let handle = self
            .matches
            .get(&match_id)
            .ok_or(EngineError::NotFound(match_id))?;
        handle.info().await
    }

    /// Lists matches whose label satisfies `query` and whose participant
    /// count lies in `min_size..=max_size`, ordered by match ID.
    ///
    /// Queries each actor for its current info. Matches that fail to
    /// respond (e.g. mid-shutdown) are silently skipped.
    pub async fn list(
        &self,
        query: &LabelQuery,
        min_size: usize,
        max_size: usize,
    ) -> Vec<MatchInfo> {
        let mut infos = Vec::with_capacity(self.matches.len());
        for handle in self.matches.values() {
            if let Ok(info) = handle.info().await {
                if query.matches(&info.label)
                    && info.player_count >= min_size
                    && info.player_count <= max_size
                {
                    infos.push(info);
                }
            }
        }
        infos.sort_by_key(|info| info.match_id);
        infos
    }

    /// Shuts down a match and removes all its players from the index.
    pub async fn terminate(
        &mut self,
        match_id: MatchId,
        grace: Duration,
    ) -> Result<(), EngineError> {
        let handle = self
            .matches
            .remove(&match_id)
            .ok_or(EngineError::NotFound(match_id))?;

        let _ = handle.terminate(grace).await;

        // Remove all players that were in this match.
        self.player_matches.retain(|_, mid| *mid != match_id);

        tracing::info!(%match_id, "match terminated by registry");
        Ok(())
    }

    /// Drops handles of actors that have stopped on their own (empty
    /// timeout) and prunes their players from the index. Returns how many
    /// matches were swept.
    ///
    /// Actors cannot remove their own registry entries, so the server
    /// calls this periodically.
    pub fn sweep(&mut self) -> usize {
        let before = self.matches.len();
        self.matches.retain(|match_id, handle| {
            let alive = !handle.is_closed();
            if !alive {
                tracing::debug!(%match_id, "sweeping stopped match");
            }
            alive
        });

        let swept = before - self.matches.len();
        if swept > 0 {
            self.player_matches
                .retain(|_, match_id| self.matches.contains_key(match_id));
            tracing::info!(swept, remaining = self.matches.len(), "registry swept");
        }
        swept
    }

    /// Returns the match ID a player is currently in, if any.
    pub fn player_match(&self, player_id: &PlayerId) -> Option<MatchId> {
        self.player_matches.get(player_id).copied()
    }

    /// Returns the number of active matches.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Lists all active match IDs, ordered.
    pub fn match_ids(&self) -> Vec<MatchId> {
        let mut ids: Vec<MatchId> = self.matches.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl<H: MatchHandler> Default for MatchRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
