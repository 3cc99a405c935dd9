//! # Gridlock
//!
//! Server-authoritative tic-tac-toe over WebSockets.
//!
//! Gridlock keeps every rule on the server: clients send commands, the
//! [`TicTacToe`](gridlock_tictactoe::TicTacToe) authority validates
//! them, and everyone in the match receives the resulting state
//! snapshot. The crates underneath handle transport, sessions, and the
//! match runtime; this crate wires them into a runnable server.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridlock::prelude::*;
//!
//! // Implement Authenticator for your token scheme, then:
//! // let server = GridlockServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build(my_auth)
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod rpc;
mod server;

pub use error::GridlockError;
pub use rpc::{RPC_CREATE_MATCH, RPC_FIND_MATCH};
pub use server::{GridlockServer, GridlockServerBuilder, PROTOCOL_VERSION};

/// One-stop imports for building and talking to a Gridlock server.
pub mod prelude {
    pub use crate::{
        GridlockError, GridlockServer, GridlockServerBuilder, PROTOCOL_VERSION, RPC_CREATE_MATCH,
        RPC_FIND_MATCH,
    };

    pub use gridlock_match::{
        Effect, EngineError, EventSender, JoinDecision, LabelQuery, MatchConfig, MatchHandler,
        MatchInfo, MatchLabel, MatchPhase, MatchRegistry, Outbox,
    };
    pub use gridlock_protocol::{
        Codec, Envelope, JsonCodec, MatchId, PlayerId, Presence, ProtocolError, Recipient,
        SocketMessage,
    };
    pub use gridlock_session::{Authenticator, SessionError, SessionManager};
    pub use gridlock_tick::{TickConfig, TickInfo};
    pub use gridlock_tictactoe::{
        Board, ClientCommand, Mark, MatchState, ServerEvent, TicTacToe, ERR_GAME_OVER,
        ERR_INVALID_MOVE, ERR_MATCH_FULL, ERR_NOT_YOUR_TURN, OP_ERROR, OP_MOVE, OP_RESET,
        OP_STATE,
    };
}
