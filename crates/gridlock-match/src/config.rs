//! Match runtime configuration and lifecycle phases.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Configuration for a match instance.
///
/// Handlers override these defaults by implementing
/// [`MatchHandler::match_config`](crate::MatchHandler::match_config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Participants required before the match counts as in progress.
    pub min_players: usize,

    /// Tick rate in Hz. Clamped to the scheduler's supported range.
    pub tick_rate: u32,

    /// How long a match may sit with zero participants before the actor
    /// terminates itself. Measured from creation and from the last
    /// departure.
    pub max_empty: Duration,

    /// Maximum number of queued player commands drained per tick.
    /// Commands beyond the batch stay queued for the next tick.
    pub tick_batch: usize,

    /// Command channel size for the match actor (backpressure bound).
    pub channel_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            tick_rate: 5,
            max_empty: Duration::from_secs(30),
            tick_batch: 128,
            channel_size: 64,
        }
    }
}

impl MatchConfig {
    /// Clamp any unusable values so the config is safe to run with.
    ///
    /// Called by the actor spawner. A `tick_batch` or `channel_size` of 0
    /// would wedge the match (commands never drain / never arrive), and a
    /// `min_players` of 0 would report an empty match as in progress.
    pub fn validated(mut self) -> Self {
        if self.min_players == 0 {
            self.min_players = 1;
        }
        if self.tick_batch == 0 {
            tracing::warn!("tick_batch of 0 would never drain commands — clamping to 1");
            self.tick_batch = 1;
        }
        if self.channel_size == 0 {
            tracing::warn!("channel_size of 0 is not supported — clamping to 1");
            self.channel_size = 1;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a match.
///
/// Unlike a strictly ordered state machine, the phase is *derived*: the
/// actor recomputes it from the participant count and the handler's
/// `is_finished` after every command. That makes replays natural — a
/// finished match that the handler resets simply derives back to
/// `InProgress`.
///
/// - **WaitingForPlayers**: fewer than `min_players` participants.
/// - **InProgress**: enough participants, game not finished.
/// - **Finished**: the handler reports the game as over. Participants can
///   still send commands (e.g. a rematch request).
/// - **Terminated**: the actor has stopped. Absorbing — nothing leaves
///   this phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    WaitingForPlayers,
    InProgress,
    Finished,
    Terminated,
}

impl MatchPhase {
    /// Returns `true` for the absorbing terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}
