//! Interactive terminal client for Gridlock.
//!
//! ```text
//! GRIDLOCK_ADDR=127.0.0.1:8080 GRIDLOCK_TOKEN=alice-laptop \
//!     cargo run --bin gridlock-client
//! ```
//!
//! Connects, authenticates, asks the server for a match (`find_match`),
//! and plays from stdin: type `0`-`8` to claim a cell, `reset` for a
//! rematch once the game is over, `leave` to leave the match, `quit` to
//! disconnect. Everything shown comes from server snapshots; the client
//! holds no game state of its own.

use std::time::{Duration, Instant};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use gridlock::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Client-side connection bookkeeping: sink, envelope counter, clock.
struct Wire {
    sink: SplitSink<Ws, Message>,
    seq: u64,
    started: Instant,
}

impl Wire {
    async fn send(&mut self, msg: SocketMessage) -> Result<(), Box<dyn std::error::Error>> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.started.elapsed().as_millis() as u64,
            msg,
        };
        self.seq += 1;
        let bytes = JsonCodec.encode(&envelope)?;
        self.sink.send(Message::Binary(bytes.into())).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::var("GRIDLOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let token = std::env::var("GRIDLOCK_TOKEN")
        .unwrap_or_else(|_| format!("guest-{}", std::process::id()));

    println!("connecting to {addr} as {token}");
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}")).await?;
    let (sink, mut stream) = ws.split();
    let mut wire = Wire {
        sink,
        seq: 0,
        started: Instant::now(),
    };

    // Handshake.
    wire.send(SocketMessage::Handshake {
        version: PROTOCOL_VERSION,
        token: Some(token),
    })
    .await?;
    let me = match next_envelope(&mut stream).await.map(|env| env.msg) {
        Some(SocketMessage::HandshakeAck { presence, .. }) => presence,
        Some(SocketMessage::Error { code, message }) => {
            return Err(format!("server refused handshake: {code} {message}").into());
        }
        other => return Err(format!("unexpected handshake reply: {other:?}").into()),
    };
    println!("connected as {me}");

    // Find (or create) a match, then join it. The join confirmation and
    // the first snapshot arrive in the main loop below.
    wire.send(SocketMessage::Rpc {
        id: RPC_FIND_MATCH.to_string(),
        payload: "{}".to_string(),
    })
    .await?;
    let match_id = match next_envelope(&mut stream).await.map(|env| env.msg) {
        Some(SocketMessage::RpcResponse { payload, .. }) => parse_match_id(&payload)?,
        Some(SocketMessage::Error { code, message }) => {
            return Err(format!("matchmaking failed: {code} {message}").into());
        }
        other => return Err(format!("unexpected rpc reply: {other:?}").into()),
    };
    wire.send(SocketMessage::JoinMatch { match_id }).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut heartbeat = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            envelope = next_envelope(&mut stream) => {
                let Some(envelope) = envelope else {
                    println!("server closed the connection");
                    break;
                };
                handle_server_message(envelope.msg, me.player_id);
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_input(&mut wire, line.trim()).await? {
                            break;
                        }
                    }
                    _ => {
                        let bye = SocketMessage::Disconnect {
                            reason: "stdin closed".to_string(),
                        };
                        let _ = wire.send(bye).await;
                        break;
                    }
                }
            }
            _ = heartbeat.tick() => {
                let client_time = wire.started.elapsed().as_millis() as u64;
                wire.send(SocketMessage::Heartbeat { client_time }).await?;
            }
        }
    }

    Ok(())
}

/// Reads frames until one decodes as an [`Envelope`].
///
/// Skips pings and undecodable frames; `None` means the server is gone.
async fn next_envelope(stream: &mut SplitStream<Ws>) -> Option<Envelope> {
    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(_) => return None,
        };
        match message {
            Message::Close(_) => return None,
            Message::Binary(_) | Message::Text(_) => {
                if let Ok(envelope) = JsonCodec.decode::<Envelope>(&message.into_data()) {
                    return Some(envelope);
                }
            }
            _ => {}
        }
    }
    None
}

/// Applies one line of user input. Returns `false` when the user quits.
async fn handle_input(
    wire: &mut Wire,
    input: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    match input {
        "" => {}
        "quit" | "exit" => {
            wire.send(SocketMessage::Disconnect {
                reason: "user quit".to_string(),
            })
            .await?;
            return Ok(false);
        }
        "leave" => wire.send(SocketMessage::LeaveMatch).await?,
        "reset" => send_command(wire, ClientCommand::Reset).await?,
        other => match other.parse::<i32>() {
            Ok(position) => send_command(wire, ClientCommand::Move { position }).await?,
            Err(_) => println!("commands: 0-8, reset, leave, quit"),
        },
    }
    Ok(true)
}

async fn send_command(
    wire: &mut Wire,
    command: ClientCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let (op_code, data) = command.encode()?;
    wire.send(SocketMessage::MatchDataSend { op_code, data }).await
}

fn handle_server_message(msg: SocketMessage, me: PlayerId) {
    match msg {
        SocketMessage::MatchData { op_code, data } => {
            match ServerEvent::decode(op_code, &data) {
                Ok(ServerEvent::State(state)) => render(&state, me),
                Ok(ServerEvent::Error { error }) => println!("rejected: {error}"),
                Err(_) => {}
            }
        }
        SocketMessage::MatchJoined { match_id } => println!("joined {match_id}"),
        SocketMessage::Error { code, message } => println!("error {code}: {message}"),
        SocketMessage::Disconnect { reason } => println!("server disconnecting: {reason}"),
        _ => {}
    }
}

/// Pulls the match ID out of a matchmaking reply (`{"matchId":N}`).
fn parse_match_id(payload: &str) -> Result<MatchId, Box<dyn std::error::Error>> {
    #[derive(serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Reply {
        match_id: MatchId,
    }
    let reply: Reply = serde_json::from_str(payload)?;
    Ok(reply.match_id)
}

/// Draws the board (indices shown for empty cells) and a status line.
fn render(state: &MatchState, me: PlayerId) {
    println!();
    for row in 0..3 {
        let cells: Vec<String> = (0..3)
            .map(|col| {
                let index = row * 3 + col;
                match state.board.cell(index) {
                    Some(mark) => format!(" {mark} "),
                    None => format!(" {index} "),
                }
            })
            .collect();
        println!("{}", cells.join("|"));
        if row < 2 {
            println!("---+---+---");
        }
    }
    println!("{}", status_line(state, me));
}

fn status_line(state: &MatchState, me: PlayerId) -> String {
    if state.game_over {
        let verdict = match state.winner {
            Some(winner) if winner == me => "You win!",
            Some(_) => "You lose.",
            None => "Draw.",
        };
        format!("{verdict} Type `reset` to play again.")
    } else if state.players.len() < 2 {
        "waiting for an opponent".to_string()
    } else if state.current_player == Some(me) {
        match state.mark_of(me) {
            Some(mark) => format!("your turn ({mark}): pick 0-8"),
            None => "your turn: pick 0-8".to_string(),
        }
    } else {
        "opponent's turn".to_string()
    }
}
