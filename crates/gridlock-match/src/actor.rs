//! Match actor: an isolated Tokio task that owns one match.
//!
//! Each match runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the "actor model" — no shared mutable
//! state, just message passing. Join/leave/info commands are handled as
//! they arrive; gameplay commands are queued and drained once per tick so
//! the handler sees a strictly sequential, tick-aligned stream.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use gridlock_protocol::{MatchId, PlayerId, Presence, Recipient};
use gridlock_tick::{TickConfig, TickInfo, TickScheduler};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::handler::Effect;
use crate::{
    EngineError, JoinDecision, MatchConfig, MatchHandler, MatchLabel, MatchPhase, Outbox,
};

/// Queued commands are capped at this many tick batches. Beyond that a
/// flooding client loses messages instead of growing the queue.
const PENDING_LIMIT_BATCHES: usize = 8;

/// Channel sender for delivering match events to a player's connection
/// handler.
pub type EventSender<H> = mpsc::UnboundedSender<<H as MatchHandler>::Event>;

/// Commands sent to a match actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel — the caller
/// sends a command and waits for the response on it.
pub(crate) enum MatchCommand<H: MatchHandler> {
    /// Add a player to the match.
    Join {
        presence: Presence,
        sender: EventSender<H>,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Remove a player from the match.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Deliver a gameplay command from a player (queued until the tick).
    Data {
        sender: PlayerId,
        command: H::Command,
    },

    /// Request the current match metadata.
    GetInfo { reply: oneshot::Sender<MatchInfo> },

    /// Shut down the match.
    Terminate { grace: Duration },
}

/// A snapshot of match metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct MatchInfo {
    /// The match's unique ID.
    pub match_id: MatchId,
    /// Current lifecycle phase.
    pub phase: MatchPhase,
    /// The label the handler last published.
    pub label: MatchLabel,
    /// Number of participants currently in the match.
    pub player_count: usize,
    /// The last tick the actor completed.
    pub tick: u64,
}

/// Handle to a running match actor. Used to send commands to it.
///
/// Cheap to clone — it's just an `mpsc::Sender` wrapper. The
/// `MatchRegistry` holds one of these per match.
pub struct MatchHandle<H: MatchHandler> {
    match_id: MatchId,
    sender: mpsc::Sender<MatchCommand<H>>,
}

// Manual impl: `H` itself is never cloned, only the channel sender, so no
// `H: Clone` bound belongs here.
impl<H: MatchHandler> Clone for MatchHandle<H> {
    fn clone(&self) -> Self {
        Self {
            match_id: self.match_id,
            sender: self.sender.clone(),
        }
    }
}

impl<H: MatchHandler> MatchHandle<H> {
    /// Returns the match's unique ID.
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Returns `true` once the actor has stopped and can no longer
    /// receive commands. Used by the registry sweep.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends a join request to the match.
    pub async fn join(
        &self,
        presence: Presence,
        sender: EventSender<H>,
    ) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Join {
                presence,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))?;
        reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))?
    }

    /// Sends a leave request to the match.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))?;
        reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))?
    }

    /// Sends a gameplay command to the match (fire-and-forget; the actor
    /// queues it for the next tick).
    pub async fn send_data(
        &self,
        sender: PlayerId,
        command: H::Command,
    ) -> Result<(), EngineError> {
        self.sender
            .send(MatchCommand::Data { sender, command })
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))
    }

    /// Requests the current match info.
    pub async fn info(&self) -> Result<MatchInfo, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))?;
        reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))
    }

    /// Tells the match to shut down.
    pub async fn terminate(&self, grace: Duration) -> Result<(), EngineError> {
        self.sender
            .send(MatchCommand::Terminate { grace })
            .await
            .map_err(|_| EngineError::Unavailable(self.match_id))
    }
}

/// The internal match actor state. Runs inside a Tokio task.
struct MatchActor<H: MatchHandler> {
    match_id: MatchId,
    config: MatchConfig,
    phase: MatchPhase,
    label: MatchLabel,
    state: H::State,
    /// Participants, keyed by player ID.
    players: HashMap<PlayerId, Presence>,
    /// Per-player outbound event channels.
    senders: HashMap<PlayerId, EventSender<H>>,
    /// Gameplay commands waiting for the next tick, in arrival order.
    pending: VecDeque<(PlayerId, H::Command)>,
    /// Set while the match has zero participants; cleared on join.
    empty_since: Option<Instant>,
    last_tick: u64,
    receiver: mpsc::Receiver<MatchCommand<H>>,
}

impl<H: MatchHandler> MatchActor<H> {
    /// Runs the actor loop: commands as they arrive, ticks on schedule.
    async fn run(mut self) {
        tracing::info!(
            match_id = %self.match_id,
            rate_hz = self.config.tick_rate,
            "match actor started"
        );

        let mut scheduler = TickScheduler::new(TickConfig::with_rate(self.config.tick_rate));

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(MatchCommand::Join { presence, sender, reply }) => {
                        let result = self.handle_join(presence, sender);
                        let _ = reply.send(result);
                    }
                    Some(MatchCommand::Leave { player_id, reply }) => {
                        let result = self.handle_leave(player_id);
                        let _ = reply.send(result);
                    }
                    Some(MatchCommand::Data { sender, command }) => {
                        self.queue_data(sender, command);
                    }
                    Some(MatchCommand::GetInfo { reply }) => {
                        let _ = reply.send(self.info());
                    }
                    Some(MatchCommand::Terminate { grace }) => {
                        self.terminate(grace);
                        break;
                    }
                    // Every handle dropped — the registry is gone.
                    None => {
                        self.terminate(Duration::ZERO);
                        break;
                    }
                },
                tick = scheduler.wait_for_tick() => {
                    self.handle_tick(&tick);
                    scheduler.record_tick_end();

                    if self.empty_timed_out() {
                        tracing::info!(
                            match_id = %self.match_id,
                            max_empty = ?self.config.max_empty,
                            "empty match timed out"
                        );
                        self.terminate(Duration::ZERO);
                        break;
                    }
                }
            }
        }

        tracing::info!(match_id = %self.match_id, "match actor stopped");
    }

    fn handle_join(
        &mut self,
        presence: Presence,
        sender: EventSender<H>,
    ) -> Result<(), EngineError> {
        let player_id = presence.player_id;
        if self.players.contains_key(&player_id) {
            return Err(EngineError::AlreadyJoined(player_id, self.match_id));
        }

        if let JoinDecision::Reject(reason) = H::on_join_attempt(&self.state, &presence) {
            tracing::debug!(
                match_id = %self.match_id,
                %player_id,
                %reason,
                "join rejected by handler"
            );
            return Err(EngineError::JoinRejected {
                match_id: self.match_id,
                reason,
            });
        }

        self.players.insert(player_id, presence.clone());
        self.senders.insert(player_id, sender);
        self.empty_since = None;
        tracing::info!(
            match_id = %self.match_id,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        let mut outbox = Outbox::new();
        H::on_join(&mut self.state, &mut outbox, std::slice::from_ref(&presence));
        self.flush(outbox);
        self.update_phase();
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<(), EngineError> {
        let Some(presence) = self.players.remove(&player_id) else {
            return Err(EngineError::NotInMatch(player_id));
        };
        self.senders.remove(&player_id);
        tracing::info!(
            match_id = %self.match_id,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        let mut outbox = Outbox::new();
        H::on_leave(&mut self.state, &mut outbox, std::slice::from_ref(&presence));
        self.flush(outbox);

        if self.players.is_empty() {
            self.empty_since = Some(Instant::now());
        }
        self.update_phase();
        Ok(())
    }

    /// Queues a gameplay command for the next tick.
    fn queue_data(&mut self, sender: PlayerId, command: H::Command) {
        if !self.players.contains_key(&sender) {
            tracing::warn!(
                match_id = %self.match_id,
                player_id = %sender,
                "data from non-participant, dropping"
            );
            return;
        }
        if self.pending.len() >= self.config.tick_batch * PENDING_LIMIT_BATCHES {
            tracing::warn!(
                match_id = %self.match_id,
                player_id = %sender,
                queued = self.pending.len(),
                "command queue limit reached, dropping"
            );
            return;
        }
        self.pending.push_back((sender, command));
    }

    /// Drains one batch of queued commands and hands it to the handler.
    fn handle_tick(&mut self, tick: &TickInfo) {
        self.last_tick = tick.tick;

        let batch = self.pending.len().min(self.config.tick_batch);
        let inbox: Vec<(PlayerId, H::Command)> = self.pending.drain(..batch).collect();
        if !inbox.is_empty() {
            tracing::trace!(
                match_id = %self.match_id,
                tick = tick.tick,
                batch = inbox.len(),
                remaining = self.pending.len(),
                "draining command batch"
            );
        }

        let mut outbox = Outbox::new();
        H::on_tick(&mut self.state, &mut outbox, tick, inbox);
        self.flush(outbox);
        self.update_phase();
    }

    /// Executes the effects a handler invocation queued, in order.
    fn flush(&mut self, outbox: Outbox<H::Event>) {
        for effect in outbox.into_effects() {
            match effect {
                Effect::Deliver(recipient, event) => self.deliver(recipient, event),
                Effect::UpdateLabel(label) => {
                    if label != self.label {
                        tracing::debug!(
                            match_id = %self.match_id,
                            open = label.open,
                            "label updated"
                        );
                        self.label = label;
                    }
                }
            }
        }
    }

    /// Delivers an event to the correct recipients.
    fn deliver(&self, recipient: Recipient, event: H::Event) {
        match recipient {
            Recipient::All => {
                for sender in self.senders.values() {
                    let _ = sender.send(event.clone());
                }
            }
            Recipient::Player(player_id) => self.send_to(player_id, event),
            Recipient::AllExcept(excluded) => {
                for (player_id, sender) in &self.senders {
                    if *player_id != excluded {
                        let _ = sender.send(event.clone());
                    }
                }
            }
        }
    }

    /// Sends an event to a single participant. Silently drops if the
    /// receiver is gone (connection already closed).
    fn send_to(&self, player_id: PlayerId, event: H::Event) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    /// Re-derives the lifecycle phase from participant count and the
    /// handler's finished flag.
    fn update_phase(&mut self) {
        if self.phase == MatchPhase::Terminated {
            return;
        }
        let next = if H::is_finished(&self.state) {
            MatchPhase::Finished
        } else if self.players.len() >= self.config.min_players {
            MatchPhase::InProgress
        } else {
            MatchPhase::WaitingForPlayers
        };
        if next != self.phase {
            tracing::info!(
                match_id = %self.match_id,
                from = %self.phase,
                to = %next,
                "match phase changed"
            );
            self.phase = next;
        }
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            match_id: self.match_id,
            phase: self.phase,
            label: self.label,
            player_count: self.players.len(),
            tick: self.last_tick,
        }
    }

    fn terminate(&mut self, grace: Duration) {
        H::on_terminate(&mut self.state, grace);
        self.phase = MatchPhase::Terminated;
        tracing::info!(
            match_id = %self.match_id,
            players = self.players.len(),
            "match terminated"
        );
    }

    fn empty_timed_out(&self) -> bool {
        self.empty_since
            .is_some_and(|since| since.elapsed() >= self.config.max_empty)
    }
}

/// Spawns a match actor task and returns a handle to communicate with it.
///
/// The actor starts with the empty-timer armed: a match nobody ever joins
/// terminates itself after [`MatchConfig::max_empty`].
pub(crate) fn spawn_match<H: MatchHandler>(match_id: MatchId) -> MatchHandle<H> {
    let config = H::match_config().validated();
    let (tx, rx) = mpsc::channel(config.channel_size);
    let (state, label) = H::init();

    let actor = MatchActor::<H> {
        match_id,
        config,
        phase: MatchPhase::WaitingForPlayers,
        label,
        state,
        players: HashMap::new(),
        senders: HashMap::new(),
        pending: VecDeque::new(),
        empty_since: Some(Instant::now()),
        last_tick: 0,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MatchHandle {
        match_id,
        sender: tx,
    }
}
