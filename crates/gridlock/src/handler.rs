//! Per-connection handler: handshake, auth, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version
//!   2. Authenticate token → get Presence
//!   3. Send HandshakeAck → player is connected
//!   4. Spawn the event pump (match → socket direction)
//!   5. Loop: receive envelopes → dispatch (socket → match direction)
//!
//! A drop guard removes the session *and* leaves the match on every exit
//! path, so a dropped socket runs the same departure pipeline (forfeit
//! included) as an explicit `LeaveMatch`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use gridlock_match::EngineError;
use gridlock_protocol::{Codec, Envelope, PlayerId, Presence, SocketMessage};
use gridlock_session::Authenticator;
use gridlock_tictactoe::{ClientCommand, ServerEvent, ERR_INVALID_MOVE};
use gridlock_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::rpc;
use crate::server::{ServerState, PROTOCOL_VERSION};
use crate::GridlockError;

/// How long a client may go silent before the server hangs up.
/// Clients heartbeat every ~5 s, so this allows two missed beats.
const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// How long the client has to send its handshake after connecting.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-connection envelope bookkeeping, shared between the message loop
/// and the event pump task.
///
/// The sequence counter is atomic because two tasks stamp outbound
/// envelopes concurrently: the loop (direct replies) and the pump
/// (match events).
struct ConnectionCtx {
    seq: AtomicU64,
    started: Instant,
}

impl ConnectionCtx {
    fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Drop guard that cleans up a player when the handler exits.
///
/// Cleanup happens even if the handler errors or panics: the player
/// leaves their match first (triggering the forfeit pipeline if a game
/// was live), then the session is removed. Since `Drop` is synchronous,
/// we spawn a fire-and-forget task for the async locks.
struct ConnectionGuard<A: Authenticator, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> Drop for ConnectionGuard<A, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let left = state.registry.lock().await.leave(player_id).await;
            match left {
                Ok(match_id) => {
                    tracing::info!(%player_id, %match_id, "player left match on disconnect");
                }
                Err(EngineError::NotInMatch(_)) => {}
                Err(error) => {
                    tracing::warn!(%player_id, %error, "match cleanup on disconnect failed");
                }
            }
            let _ = state.sessions.lock().await.remove(player_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), GridlockError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    let ctx = Arc::new(ConnectionCtx::new());
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Handshake ---
    let presence = perform_handshake(&conn, &state, &ctx).await?;
    let player_id = presence.player_id;

    tracing::info!(%conn_id, player = %presence, "player authenticated");

    // Create session and guard atomically — if session creation fails
    // (duplicate identity), no guard is needed. If it succeeds, the
    // guard is immediately active.
    {
        let mut sessions = state.sessions.lock().await;
        sessions.create(presence.clone())?;
    }
    let _guard = ConnectionGuard {
        player_id,
        state: Arc::clone(&state),
    };

    // --- Step 2: Event pump (match → socket) ---
    // The match actor pushes `ServerEvent`s into this channel; the pump
    // wraps each one in a `MatchData` envelope and writes it to the
    // socket. It ends when the last sender drops (handler exit + the
    // actor processing the leave).
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    {
        let conn = conn.clone();
        let state = Arc::clone(&state);
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let (op_code, data) = match event.encode() {
                    Ok(frame) => frame,
                    Err(error) => {
                        tracing::warn!(%player_id, %error, "failed to encode match event");
                        continue;
                    }
                };
                let message = SocketMessage::MatchData { op_code, data };
                if send_message(&conn, &state.codec, &ctx, message).await.is_err() {
                    // Socket gone; the read loop will notice and clean up.
                    break;
                }
            }
        });
    }

    // --- Step 3: Message loop (socket → match) ---
    loop {
        let data = match tokio::time::timeout(READ_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                continue;
            }
        };

        match envelope.msg {
            SocketMessage::Heartbeat { client_time } => {
                let ack = SocketMessage::HeartbeatAck {
                    client_time,
                    server_time: ctx.elapsed_ms(),
                };
                send_message(&conn, &state.codec, &ctx, ack).await?;
            }

            SocketMessage::Rpc { id, payload } => {
                match rpc::dispatch(&state, player_id, &id, &payload).await? {
                    Some(reply) => {
                        let resp = SocketMessage::RpcResponse { id, payload: reply };
                        send_message(&conn, &state.codec, &ctx, resp).await?;
                    }
                    None => {
                        send_error(&conn, &state.codec, &ctx, 404, &format!("unknown rpc: {id}"))
                            .await?;
                    }
                }
            }

            SocketMessage::JoinMatch { match_id } => {
                // Lock only for the join operation, drop before network I/O.
                let join_result = {
                    let mut registry = state.registry.lock().await;
                    registry.join(presence.clone(), match_id, event_tx.clone()).await
                };

                match join_result {
                    Ok(()) => {
                        let resp = SocketMessage::MatchJoined { match_id };
                        send_message(&conn, &state.codec, &ctx, resp).await?;
                    }
                    Err(e) => {
                        send_error(&conn, &state.codec, &ctx, error_code(&e), &e.to_string())
                            .await?;
                    }
                }
            }

            SocketMessage::LeaveMatch => {
                let mut registry = state.registry.lock().await;
                if let Err(e) = registry.leave(player_id).await {
                    tracing::debug!(%player_id, error = %e, "leave match failed");
                }
            }

            SocketMessage::MatchDataSend { op_code, data } => {
                handle_match_data(&conn, &state, &ctx, player_id, op_code, &data).await?;
            }

            SocketMessage::Disconnect { reason } => {
                tracing::info!(%player_id, %reason, "client disconnected");
                break;
            }

            _ => {
                tracing::debug!(%player_id, "ignoring unexpected message");
            }
        }
    }

    // _guard drops here → leave-match and session removal fire.
    Ok(())
}

/// Performs the initial handshake: receive Handshake, validate, auth,
/// send Ack.
async fn perform_handshake<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
    ctx: &ConnectionCtx,
) -> Result<Presence, GridlockError>
where
    A: Authenticator,
    C: Codec,
{
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(invalid("connection closed before handshake"));
        }
        Ok(Err(e)) => return Err(GridlockError::Transport(e)),
        Err(_) => {
            return Err(invalid("handshake timed out"));
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let (version, token) = match envelope.msg {
        SocketMessage::Handshake { version, token } => (version, token),
        _ => {
            send_error(conn, &state.codec, ctx, 400, "expected Handshake").await?;
            return Err(invalid("first message must be Handshake"));
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            &state.codec,
            ctx,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(invalid("protocol version mismatch"));
    }

    let token_str = token.as_deref().unwrap_or("");
    let presence = match state.auth.authenticate(token_str).await {
        Ok(presence) => presence,
        Err(e) => {
            send_error(conn, &state.codec, ctx, 401, "unauthorized").await?;
            return Err(GridlockError::Session(e));
        }
    };

    let ack = SocketMessage::HandshakeAck {
        presence: presence.clone(),
        server_time: ctx.elapsed_ms(),
    };
    send_message(conn, &state.codec, ctx, ack).await?;

    Ok(presence)
}

/// Handles a gameplay frame: decode, route to the player's match.
///
/// A frame that doesn't decode never reaches the match — the sender gets
/// an opcode-4 "Invalid move" reply directly, mirroring what the
/// authority sends for a semantically bad move.
async fn handle_match_data<A, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<A, C>>,
    ctx: &ConnectionCtx,
    player_id: PlayerId,
    op_code: u8,
    data: &[u8],
) -> Result<(), GridlockError>
where
    A: Authenticator,
    C: Codec,
{
    let command = match ClientCommand::decode(op_code, data) {
        Ok(command) => command,
        Err(error) => {
            tracing::debug!(%player_id, op_code, %error, "undecodable match data");
            let (op_code, data) = ServerEvent::error(ERR_INVALID_MOVE).encode()?;
            let reply = SocketMessage::MatchData { op_code, data };
            return send_message(conn, &state.codec, ctx, reply).await;
        }
    };

    let result = state.registry.lock().await.send_data(player_id, command).await;

    if let Err(e) = result {
        send_error(conn, &state.codec, ctx, error_code(&e), &e.to_string()).await?;
    }

    Ok(())
}

/// Sends a single message wrapped in a stamped envelope.
async fn send_message<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    ctx: &ConnectionCtx,
    msg: SocketMessage,
) -> Result<(), GridlockError> {
    let envelope = Envelope {
        seq: ctx.next_seq(),
        timestamp: ctx.elapsed_ms(),
        msg,
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await.map_err(GridlockError::Transport)
}

/// Sends a `SocketMessage::Error` envelope to the client.
async fn send_error<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    ctx: &ConnectionCtx,
    code: u16,
    message: &str,
) -> Result<(), GridlockError> {
    let msg = SocketMessage::Error {
        code,
        message: message.to_string(),
    };
    send_message(conn, codec, ctx, msg).await
}

/// Maps an engine error to the HTTP-style code sent to clients.
fn error_code(error: &EngineError) -> u16 {
    match error {
        EngineError::NotFound(_) | EngineError::Unavailable(_) => 404,
        EngineError::JoinRejected { .. } | EngineError::AlreadyJoined(..) => 409,
        EngineError::NotInMatch(_) => 400,
    }
}

fn invalid(message: &str) -> GridlockError {
    GridlockError::Protocol(gridlock_protocol::ProtocolError::InvalidMessage(
        message.to_string(),
    ))
}
