//! Match runtime for Gridlock.
//!
//! Each match runs as an isolated Tokio task (actor model) with its own
//! authoritative state, participant list, and fixed-timestep tick loop.
//! Game rules plug in through a single trait; the runtime owns scheduling,
//! routing, and lifecycle.
//!
//! # Key types
//!
//! - [`MatchHandler`] — the trait game developers implement
//! - [`Outbox`] — effect buffer a handler writes broadcasts/errors into
//! - [`MatchRegistry`] — creates/terminates matches, routes players
//! - [`MatchHandle`] — send commands to a running match actor
//! - [`MatchPhase`] — derived lifecycle phase
//! - [`MatchConfig`] — match settings (tick rate, empty timeout, etc.)
//! - [`MatchLabel`] / [`LabelQuery`] — discovery metadata and its filter

mod actor;
mod config;
mod error;
mod handler;
mod label;
mod registry;

pub use actor::{EventSender, MatchHandle, MatchInfo};
pub use config::{MatchConfig, MatchPhase};
pub use error::EngineError;
pub use handler::{Effect, JoinDecision, MatchHandler, Outbox};
pub use label::{LabelQuery, MatchLabel};
pub use registry::MatchRegistry;
