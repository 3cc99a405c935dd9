//! `GridlockServer` builder and server loop.
//!
//! This is the entry point for running the Gridlock game server. It ties
//! together all the layers: transport → protocol → session → match, with
//! the tic-tac-toe authority plugged into the match runtime.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gridlock_match::MatchRegistry;
use gridlock_protocol::{Codec, JsonCodec};
use gridlock_session::{Authenticator, SessionManager};
use gridlock_tictactoe::TicTacToe;
use gridlock_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::GridlockError;

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Interior
/// mutability via `Mutex` where needed; the registry mutex guards only
/// the handle maps — each match runs in its own task and is never held
/// under the lock.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) registry: Mutex<MatchRegistry<TicTacToe>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Gridlock server.
///
/// # Example
///
/// ```rust,ignore
/// use gridlock::prelude::*;
///
/// let server = GridlockServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct GridlockServerBuilder {
    bind_addr: String,
    sweep_interval: Duration,
}

impl GridlockServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            sweep_interval: Duration::from_secs(10),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets how often the housekeeping task prunes stopped matches from
    /// the registry. Matches stop themselves (empty timeout); the sweep
    /// only drops their stale handles.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Builds and starts the server with the given authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build(
        self,
        auth: impl Authenticator,
    ) -> Result<GridlockServer<impl Authenticator, JsonCodec>, GridlockError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new()),
            registry: Mutex::new(MatchRegistry::new()),
            auth,
            codec: JsonCodec,
        });

        Ok(GridlockServer {
            transport,
            state,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for GridlockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Gridlock game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GridlockServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
    sweep_interval: Duration,
}

impl<A, C> GridlockServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> GridlockServerBuilder {
        GridlockServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, GridlockError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections, performs the handshake, and spawns
    /// a handler task for each connected player. A background task
    /// periodically sweeps self-terminated matches out of the registry.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), GridlockError> {
        tracing::info!("Gridlock server running");

        let sweeper_state = Arc::clone(&self.state);
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                sweeper_state.registry.lock().await.sweep();
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection::<A, C>(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
