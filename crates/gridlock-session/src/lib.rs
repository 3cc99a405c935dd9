//! Player session management for Gridlock.
//!
//! This crate handles the lifecycle of player connections:
//!
//! 1. **Authentication** — validating who a player is ([`Authenticator`] trait)
//! 2. **Session tracking** — knowing who's connected ([`SessionManager`])
//!
//! There is no reconnection machinery: session lifetime equals connection
//! lifetime, and the match layer treats a vanished session as a leave.
//!
//! # How it fits in the stack
//!
//! ```text
//! Match Layer (above)  ← uses presences to know which players are in which matches
//!     ↕
//! Session Layer (this crate)  ← manages player identity and connection state
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId, Presence, SocketMessage types
//! ```

mod auth;
mod error;
mod manager;
mod session;

pub use auth::Authenticator;
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::Session;
