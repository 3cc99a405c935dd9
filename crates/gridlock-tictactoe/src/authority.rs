//! The tic-tac-toe match authority.
//!
//! This is the server-resident referee: it owns the canonical
//! [`MatchState`], arbitrates joins, leaves, and moves from two
//! independently-connected clients, and answers every accepted action
//! with a full state broadcast. Clients render; they never decide.
//!
//! All rule enforcement lives here and in [`crate::board`] — nothing
//! downstream of this module re-validates a move.

use std::time::Duration;

use gridlock_match::{JoinDecision, MatchConfig, MatchHandler, MatchLabel, Outbox};
use gridlock_protocol::{PlayerId, Presence};
use gridlock_tick::TickInfo;
use rand::Rng;

use crate::board;
use crate::state::{Mark, MatchState};
use crate::wire::{
    ClientCommand, ServerEvent, ERR_GAME_OVER, ERR_INVALID_MOVE, ERR_MATCH_FULL,
    ERR_NOT_YOUR_TURN,
};

/// A tic-tac-toe match seats exactly two players.
const SEATS: usize = 2;

/// Simulation cadence. Turn-based play doesn't need a fast loop; five
/// ticks per second keeps move feedback under 200 ms.
const TICK_RATE_HZ: u32 = 5;

/// How long a match may sit with no players before the runtime reaps it.
const MAX_EMPTY: Duration = Duration::from_secs(30);

/// The authoritative tic-tac-toe rules, plugged into the match runtime.
///
/// Stateless by itself — the runtime owns the [`MatchState`] and hands it
/// to each callback. See the module docs for the rule set.
pub struct TicTacToe;

impl TicTacToe {
    /// Runs one move through the validation pipeline and, if it is legal,
    /// applies it and broadcasts the new state.
    ///
    /// Checks short-circuit in a fixed order — game over, turn, position —
    /// so a player who moves out of turn on a finished board hears
    /// "Game is over", not "Not your turn". Rejections go to the offender
    /// only and leave the state untouched.
    fn apply_move(
        state: &mut MatchState,
        outbox: &mut Outbox<ServerEvent>,
        sender: PlayerId,
        position: i32,
    ) {
        if state.game_over {
            outbox.send(sender, ServerEvent::error(ERR_GAME_OVER));
            return;
        }
        if state.current_player != Some(sender) {
            outbox.send(sender, ServerEvent::error(ERR_NOT_YOUR_TURN));
            return;
        }
        if !board::is_legal_placement(&state.board, position) {
            outbox.send(sender, ServerEvent::error(ERR_INVALID_MOVE));
            return;
        }
        let Some(mark) = state.mark_of(sender) else {
            // `current_player` always points at a seated player; a miss
            // here is a state bug, not a user error.
            tracing::warn!(player = %sender, "current player holds no seat, dropping move");
            return;
        };

        // Legality implies 0 <= position < 9.
        state.board.set(position as usize, mark);
        state.move_count += 1;

        if board::detect_win(&state.board) {
            state.winner = Some(sender);
            state.game_over = true;
            // The turn marker stays on the last mover once the game ends.
            tracing::info!(winner = %sender, moves = state.move_count, "match won");
        } else if board::is_draw(&state.board, state.move_count) {
            state.game_over = true;
            tracing::info!("match drawn");
        } else {
            state.current_player = state.other_player(sender);
        }

        outbox.broadcast(ServerEvent::State(state.clone()));
    }

    /// Starts a new round on a finished board.
    ///
    /// A reset while the game is still live is ignored outright — no
    /// error, no broadcast — so a stale button press can't wipe a game
    /// in progress.
    fn apply_reset(state: &mut MatchState, outbox: &mut Outbox<ServerEvent>, sender: PlayerId) {
        if !state.game_over {
            tracing::debug!(player = %sender, "ignoring reset while the game is live");
            return;
        }

        state.board.clear();
        state.winner = None;
        state.game_over = false;
        state.move_count = 0;
        state.current_player = Self::pick_starter(state);
        tracing::info!(starter = ?state.current_player, "match reset");

        outbox.broadcast(ServerEvent::State(state.clone()));
    }

    /// Picks who moves first in a fresh round: uniformly random over the
    /// seated players, `None` when nobody is seated.
    fn pick_starter(state: &MatchState) -> Option<PlayerId> {
        if state.players.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..state.players.len());
        state.players.keys().nth(index).copied()
    }
}

impl MatchHandler for TicTacToe {
    type State = MatchState;
    type Command = ClientCommand;
    type Event = ServerEvent;

    fn init() -> (MatchState, MatchLabel) {
        (MatchState::new(), MatchLabel::open())
    }

    fn on_join_attempt(state: &MatchState, _presence: &Presence) -> JoinDecision {
        if state.players.len() >= SEATS {
            JoinDecision::reject(ERR_MATCH_FULL)
        } else {
            JoinDecision::Accept
        }
    }

    /// Seats each joiner at the vacant marker — X first, then O. The
    /// player taking X in a not-yet-started match moves first. Fills of
    /// the second seat close the label; every join ends with a full
    /// snapshot so the joiner needs no separate sync step.
    fn on_join(state: &mut MatchState, outbox: &mut Outbox<ServerEvent>, joined: &[Presence]) {
        for presence in joined {
            if state.players.contains_key(&presence.player_id) {
                // A player who already holds a seat keeps it.
                tracing::debug!(player = %presence, "joiner already seated");
                continue;
            }
            let Some(mark) = state.vacant_mark() else {
                // The runtime admits at most two participants; a third
                // presence reaching this point is an upstream bug.
                tracing::warn!(player = %presence, "no seat left for joiner, skipping");
                continue;
            };
            state.players.insert(presence.player_id, mark);
            if mark == Mark::X && state.move_count == 0 && !state.game_over {
                state.current_player = Some(presence.player_id);
            }
            tracing::info!(player = %presence, %mark, "player seated");
        }

        if state.players.len() >= SEATS {
            outbox.update_label(MatchLabel::closed());
        }
        outbox.broadcast(ServerEvent::State(state.clone()));
    }

    /// Vacates each departed player's seat. A departure from a live game
    /// with an opponent still seated is a forfeit: the opponent wins and
    /// the result is broadcast. A departure that leaves the match empty
    /// just clears the seat and the turn marker. The label never reopens.
    fn on_leave(state: &mut MatchState, outbox: &mut Outbox<ServerEvent>, departed: &[Presence]) {
        for presence in departed {
            if state.players.remove(&presence.player_id).is_none() {
                continue;
            }
            tracing::info!(player = %presence, "player left the match");

            if state.game_over {
                continue;
            }
            match state.players.keys().next().copied() {
                Some(remaining) => {
                    state.winner = Some(remaining);
                    state.game_over = true;
                    state.current_player = None;
                    tracing::info!(winner = %remaining, "match forfeited by departure");
                    outbox.broadcast(ServerEvent::State(state.clone()));
                }
                None => {
                    state.current_player = None;
                }
            }
        }
    }

    fn on_tick(
        state: &mut MatchState,
        outbox: &mut Outbox<ServerEvent>,
        _tick: &TickInfo,
        inbox: Vec<(PlayerId, ClientCommand)>,
    ) {
        for (sender, command) in inbox {
            match command {
                ClientCommand::Move { position } => {
                    Self::apply_move(state, outbox, sender, position)
                }
                ClientCommand::Reset => Self::apply_reset(state, outbox, sender),
            }
        }
    }

    fn on_terminate(_state: &mut MatchState, grace: Duration) {
        tracing::info!(?grace, "tic-tac-toe match terminating");
    }

    fn is_finished(state: &MatchState) -> bool {
        state.game_over
    }

    fn match_config() -> MatchConfig {
        MatchConfig {
            tick_rate: TICK_RATE_HZ,
            max_empty: MAX_EMPTY,
            ..MatchConfig::default()
        }
    }
}
