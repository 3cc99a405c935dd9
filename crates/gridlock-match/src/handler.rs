//! The `MatchHandler` trait — the main extension point for game developers.
//!
//! This is the single trait that game developers implement. The match actor
//! calls these functions at the right time; the developer just writes game
//! rules. Everything a handler wants to say to the outside world goes
//! through the [`Outbox`] it is handed.

use std::time::Duration;

use gridlock_protocol::{PlayerId, Presence, Recipient};
use gridlock_tick::TickInfo;

use crate::{MatchConfig, MatchLabel};

/// The outcome of a join attempt, decided by the handler *before* the
/// candidate is registered as a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinDecision {
    /// Let the player in.
    Accept,
    /// Turn the player away. The reason travels back to the requester
    /// (and nobody else).
    Reject(String),
}

impl JoinDecision {
    /// Shorthand for `Reject` with a displayable reason.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject(reason.into())
    }

    /// Returns `true` if the decision lets the player in.
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// A single buffered effect drained from an [`Outbox`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<E> {
    /// Deliver `event` to the given recipients.
    Deliver(Recipient, E),
    /// Replace the match label visible through `info`/`list`.
    UpdateLabel(MatchLabel),
}

/// Buffers the effects emitted by a single handler invocation.
///
/// Handlers never talk to sockets or registries directly — they record
/// what should happen, and the actor executes the effects after the
/// handler returns, in emission order. This keeps handler functions pure
/// enough to unit-test without any runtime: call the function, then
/// inspect [`Outbox::into_effects`].
#[derive(Debug)]
pub struct Outbox<E> {
    effects: Vec<Effect<E>>,
}

impl<E> Outbox<E> {
    /// Creates an empty outbox.
    pub fn new() -> Self {
        Self { effects: Vec::new() }
    }

    /// Queues `event` for every participant in the match.
    pub fn broadcast(&mut self, event: E) {
        self.effects.push(Effect::Deliver(Recipient::All, event));
    }

    /// Queues `event` for one participant only.
    /// Used for validation errors, which only the offender sees.
    pub fn send(&mut self, player: PlayerId, event: E) {
        self.effects.push(Effect::Deliver(Recipient::Player(player), event));
    }

    /// Queues `event` for every participant except `player`.
    pub fn send_except(&mut self, player: PlayerId, event: E) {
        self.effects
            .push(Effect::Deliver(Recipient::AllExcept(player), event));
    }

    /// Queues a label replacement.
    pub fn update_label(&mut self, label: MatchLabel) {
        self.effects.push(Effect::UpdateLabel(label));
    }

    /// Returns `true` if no effects have been queued.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Number of queued effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Consumes the outbox, yielding the effects in emission order.
    pub fn into_effects(self) -> Vec<Effect<E>> {
        self.effects
    }
}

impl<E> Default for Outbox<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// The core trait that game developers implement.
///
/// Each associated type defines the shape of the game's data:
/// - `State` — the authoritative game state, owned exclusively by the
///   match actor
/// - `Command` — decoded commands clients send (moves, requests)
/// - `Event` — what the server sends back (state snapshots, errors)
///
/// All functions are associated functions, not methods: a handler is a
/// strategy, not an object, so there is no `self` to mutate. The actor
/// owns the `State` and passes it in.
///
/// # Call order
///
/// The actor invokes these strictly sequentially per match — no two
/// handler functions ever run concurrently for the same match:
///
/// 1. `init` once at spawn,
/// 2. `on_join_attempt` then `on_join` per accepted joiner,
/// 3. `on_tick` at the configured cadence with the queued command batch,
/// 4. `on_leave` per departure,
/// 5. `on_terminate` once, when the match shuts down.
pub trait MatchHandler: Send + Sync + 'static {
    /// The authoritative game state.
    type State: Send + 'static;

    /// Commands that clients send to the match (already decoded).
    type Command: Send + 'static;

    /// Events that the match sends to clients.
    type Event: Clone + Send + 'static;

    /// Creates the initial state and the label the match advertises.
    ///
    /// Called once when the match is created, before anyone joins.
    fn init() -> (Self::State, MatchLabel);

    /// Decides whether a candidate may join.
    ///
    /// Called before the candidate is counted as a participant, so the
    /// state still describes the match *without* them. Default: accept.
    fn on_join_attempt(_state: &Self::State, _presence: &Presence) -> JoinDecision {
        JoinDecision::Accept
    }

    /// Registers players that have joined, in delivery order.
    ///
    /// By the time this runs the joiners are participants: anything
    /// broadcast here reaches them too.
    fn on_join(state: &mut Self::State, outbox: &mut Outbox<Self::Event>, joined: &[Presence]);

    /// Handles players that have left, in delivery order.
    ///
    /// The departed are no longer participants: broadcasts here reach
    /// only the players that remain.
    fn on_leave(state: &mut Self::State, outbox: &mut Outbox<Self::Event>, departed: &[Presence]);

    /// Advances the match by one tick.
    ///
    /// `inbox` holds the commands that arrived since the last tick, in
    /// arrival order, capped at [`MatchConfig::tick_batch`]. It is empty
    /// on quiet ticks — real-time games still get their cadence.
    fn on_tick(
        state: &mut Self::State,
        outbox: &mut Outbox<Self::Event>,
        tick: &TickInfo,
        inbox: Vec<(PlayerId, Self::Command)>,
    );

    /// Called once when the match shuts down (empty timeout, registry
    /// terminate, or server shutdown). Default: no-op.
    fn on_terminate(_state: &mut Self::State, _grace: Duration) {}

    /// Returns `true` if the game is over.
    ///
    /// Drives the `Finished` phase. A handler that supports rematches may
    /// later return `false` again for the same match.
    fn is_finished(state: &Self::State) -> bool;

    /// Returns the runtime configuration for this game type.
    ///
    /// Override to customize tick rate, empty-match timeout, etc.
    /// Default: [`MatchConfig::default`] (2 players, 5 Hz, 30 s timeout).
    fn match_config() -> MatchConfig {
        MatchConfig::default()
    }
}
