//! Integration tests for the Gridlock server: handshake, matchmaking,
//! and complete games over real WebSockets.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridlock::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Test authenticator
// =========================================================================

/// Accepts any numeric token as the player's identity.
struct TestAuth;

impl Authenticator for TestAuth {
    async fn authenticate(&self, token: &str) -> Result<Presence, SessionError> {
        let id: u64 = token
            .parse()
            .map_err(|_| SessionError::AuthFailed("not a number".into()))?;
        Ok(Presence::new(PlayerId(id), format!("player-{id}")))
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = GridlockServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(TestAuth)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn encode_envelope(envelope: &Envelope) -> Message {
    let bytes = serde_json::to_vec(envelope).expect("encode");
    Message::Binary(bytes.into())
}

fn decode_envelope(msg: Message) -> Envelope {
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

async fn send(ws: &mut ClientWs, seq: u64, msg: SocketMessage) {
    let envelope = Envelope {
        seq,
        timestamp: 0,
        msg,
    };
    ws.send(encode_envelope(&envelope)).await.expect("send");
}

/// Receives the next message, with a timeout so a missing reply fails
/// the test instead of hanging it.
async fn recv_message(ws: &mut ClientWs) -> SocketMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed")
            .expect("websocket error");
        if matches!(frame, Message::Binary(_) | Message::Text(_)) {
            return decode_envelope(frame).msg;
        }
    }
}

/// Sends a handshake and returns the presence the server minted.
async fn handshake(ws: &mut ClientWs, player_id: u64) -> Presence {
    send(
        ws,
        0,
        SocketMessage::Handshake {
            version: PROTOCOL_VERSION,
            token: Some(player_id.to_string()),
        },
    )
    .await;
    match recv_message(ws).await {
        SocketMessage::HandshakeAck { presence, .. } => presence,
        other => panic!("expected HandshakeAck, got {other:?}"),
    }
}

fn match_id_from(payload: &str) -> MatchId {
    let value: serde_json::Value = serde_json::from_str(payload).expect("rpc payload json");
    MatchId(value["matchId"].as_u64().expect("matchId field"))
}

/// Calls the `create_match` RPC and returns the new match's ID.
async fn create_match(ws: &mut ClientWs, seq: u64) -> MatchId {
    send(
        ws,
        seq,
        SocketMessage::Rpc {
            id: RPC_CREATE_MATCH.to_string(),
            payload: "{}".to_string(),
        },
    )
    .await;
    match recv_message(ws).await {
        SocketMessage::RpcResponse { payload, .. } => match_id_from(&payload),
        other => panic!("expected RpcResponse, got {other:?}"),
    }
}

/// Calls the `find_match` RPC and returns the match it picked.
async fn find_match(ws: &mut ClientWs, seq: u64) -> MatchId {
    send(
        ws,
        seq,
        SocketMessage::Rpc {
            id: RPC_FIND_MATCH.to_string(),
            payload: "{}".to_string(),
        },
    )
    .await;
    match recv_message(ws).await {
        SocketMessage::RpcResponse { payload, .. } => match_id_from(&payload),
        other => panic!("expected RpcResponse, got {other:?}"),
    }
}

/// Joins `match_id` and returns the snapshot broadcast for the join.
///
/// The join confirmation and the snapshot come from different tasks on
/// the server, so they can arrive in either order.
async fn join_match(ws: &mut ClientWs, seq: u64, match_id: MatchId) -> MatchState {
    send(ws, seq, SocketMessage::JoinMatch { match_id }).await;
    let mut joined = false;
    let mut snapshot = None;
    while !joined || snapshot.is_none() {
        match recv_message(ws).await {
            SocketMessage::MatchJoined { match_id: m } => {
                assert_eq!(m, match_id);
                joined = true;
            }
            SocketMessage::MatchData { op_code, data } => {
                if let Ok(ServerEvent::State(state)) = ServerEvent::decode(op_code, &data) {
                    snapshot = Some(state);
                }
            }
            other => panic!("expected join traffic, got {other:?}"),
        }
    }
    snapshot.expect("loop exits only with a snapshot")
}

/// Waits for the next state snapshot, skipping other traffic.
async fn recv_state(ws: &mut ClientWs) -> MatchState {
    loop {
        if let SocketMessage::MatchData { op_code, data } = recv_message(ws).await {
            if let Ok(ServerEvent::State(state)) = ServerEvent::decode(op_code, &data) {
                return state;
            }
        }
    }
}

/// Waits for the next in-match validation error, skipping other traffic.
async fn recv_match_error(ws: &mut ClientWs) -> String {
    loop {
        if let SocketMessage::MatchData { op_code, data } = recv_message(ws).await {
            if let Ok(ServerEvent::Error { error }) = ServerEvent::decode(op_code, &data) {
                return error;
            }
        }
    }
}

async fn send_move(ws: &mut ClientWs, seq: u64, position: i32) {
    let (op_code, data) = ClientCommand::Move { position }
        .encode()
        .expect("encode move");
    send(ws, seq, SocketMessage::MatchDataSend { op_code, data }).await;
}

// =========================================================================
// Handshake and connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_handshake_success() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let presence = handshake(&mut ws, 42).await;
    assert_eq!(presence.player_id, PlayerId(42));
    assert_eq!(presence.username, "player-42");
}

#[tokio::test]
async fn test_handshake_version_mismatch() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        0,
        SocketMessage::Handshake {
            version: 999,
            token: Some("1".to_string()),
        },
    )
    .await;

    match recv_message(&mut ws).await {
        SocketMessage::Error { code, message } => {
            assert_eq!(code, 400);
            assert!(message.contains("version mismatch"));
        }
        other => panic!("expected Error 400, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handshake_auth_failure() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        0,
        SocketMessage::Handshake {
            version: PROTOCOL_VERSION,
            token: Some("not-a-number".to_string()),
        },
    )
    .await;

    match recv_message(&mut ws).await {
        SocketMessage::Error { code, .. } => assert_eq!(code, 401),
        other => panic!("expected Error 401, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handshake_non_handshake_first_message() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    // A heartbeat as the first message should be rejected.
    send(&mut ws, 0, SocketMessage::Heartbeat { client_time: 0 }).await;

    match recv_message(&mut ws).await {
        SocketMessage::Error { code, .. } => assert_eq!(code, 400),
        other => panic!("expected Error 400, got {other:?}"),
    }
}

#[tokio::test]
async fn test_heartbeat_response() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    send(
        &mut ws,
        1,
        SocketMessage::Heartbeat { client_time: 12345 },
    )
    .await;

    match recv_message(&mut ws).await {
        SocketMessage::HeartbeatAck { client_time, .. } => {
            assert_eq!(client_time, 12345);
            // server_time is millis since connection start; may be 0 if fast.
        }
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_envelope_ignored() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    // Send garbage data.
    ws.send(Message::Binary(b"not json".to_vec().into()))
        .await
        .expect("send");

    // A valid heartbeat should still work (bad envelope was skipped).
    send(&mut ws, 1, SocketMessage::Heartbeat { client_time: 999 }).await;

    assert!(matches!(
        recv_message(&mut ws).await,
        SocketMessage::HeartbeatAck { .. }
    ));
}

#[tokio::test]
async fn test_disconnect_closes_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    send(
        &mut ws,
        1,
        SocketMessage::Disconnect {
            reason: "bye".to_string(),
        },
    )
    .await;

    // Server should close the connection after Disconnect.
    let result = tokio::time::timeout(Duration::from_secs(2), ws.next()).await;

    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {} // expected
        Ok(Some(Err(_))) => {}                           // also fine
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_multiple_connections_independent() {
    let addr = start_server().await;

    let mut ws1 = connect(&addr).await;
    let mut ws2 = connect(&addr).await;

    let p1 = handshake(&mut ws1, 10).await;
    let p2 = handshake(&mut ws2, 20).await;

    assert_eq!(p1.player_id, PlayerId(10));
    assert_eq!(p2.player_id, PlayerId(20));
}

// =========================================================================
// RPC and match membership
// =========================================================================

#[tokio::test]
async fn test_rpc_unknown_name_is_404() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    send(
        &mut ws,
        1,
        SocketMessage::Rpc {
            id: "no_such_rpc".to_string(),
            payload: "{}".to_string(),
        },
    )
    .await;

    match recv_message(&mut ws).await {
        SocketMessage::Error { code, message } => {
            assert_eq!(code, 404);
            assert!(message.contains("unknown rpc"));
        }
        other => panic!("expected Error 404, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_match_rpc_returns_match_id() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    send(
        &mut ws,
        1,
        SocketMessage::Rpc {
            id: RPC_CREATE_MATCH.to_string(),
            payload: "{}".to_string(),
        },
    )
    .await;

    match recv_message(&mut ws).await {
        SocketMessage::RpcResponse { id, payload } => {
            assert_eq!(id, RPC_CREATE_MATCH);
            assert!(payload.contains("matchId"));
            assert!(match_id_from(&payload).0 > 0);
        }
        other => panic!("expected RpcResponse, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_match_not_found() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    send(
        &mut ws,
        1,
        SocketMessage::JoinMatch {
            match_id: MatchId(999_999),
        },
    )
    .await;

    match recv_message(&mut ws).await {
        SocketMessage::Error { code, message } => {
            assert_eq!(code, 404);
            assert!(message.contains("not found"));
        }
        other => panic!("expected Error 404, got {other:?}"),
    }
}

#[tokio::test]
async fn test_match_data_when_not_in_match() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    // A well-formed move from a player who never joined a match.
    send_move(&mut ws, 1, 4).await;

    match recv_message(&mut ws).await {
        SocketMessage::Error { code, message } => {
            assert_eq!(code, 400);
            assert!(message.contains("is not in a match"));
        }
        other => panic!("expected Error 400, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_match_data_rejected_as_invalid_move() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, 1).await;

    let match_id = create_match(&mut ws, 1).await;
    join_match(&mut ws, 2, match_id).await;

    // Bytes that don't decode as a move never reach the match; the
    // sender gets the same opcode-4 reply a bad move would produce.
    send(
        &mut ws,
        3,
        SocketMessage::MatchDataSend {
            op_code: OP_MOVE,
            data: b"garbage".to_vec(),
        },
    )
    .await;

    assert_eq!(recv_match_error(&mut ws).await, ERR_INVALID_MOVE);
}

#[tokio::test]
async fn test_find_match_pairs_two_players_then_opens_new() {
    let addr = start_server().await;

    let mut ws1 = connect(&addr).await;
    handshake(&mut ws1, 31).await;
    let first = find_match(&mut ws1, 1).await;
    join_match(&mut ws1, 2, first).await;

    // The second player is steered into the waiting match.
    let mut ws2 = connect(&addr).await;
    handshake(&mut ws2, 32).await;
    assert_eq!(find_match(&mut ws2, 1).await, first);
    join_match(&mut ws2, 2, first).await;

    // The match is now full, so a third player gets a fresh one.
    let mut ws3 = connect(&addr).await;
    handshake(&mut ws3, 33).await;
    assert_ne!(find_match(&mut ws3, 1).await, first);
}

#[tokio::test]
async fn test_third_player_rejected_when_full() {
    let addr = start_server().await;

    let mut ws1 = connect(&addr).await;
    handshake(&mut ws1, 41).await;
    let match_id = create_match(&mut ws1, 1).await;
    join_match(&mut ws1, 2, match_id).await;

    let mut ws2 = connect(&addr).await;
    handshake(&mut ws2, 42).await;
    join_match(&mut ws2, 1, match_id).await;

    let mut ws3 = connect(&addr).await;
    handshake(&mut ws3, 43).await;
    send(&mut ws3, 1, SocketMessage::JoinMatch { match_id }).await;

    match recv_message(&mut ws3).await {
        SocketMessage::Error { code, message } => {
            assert_eq!(code, 409);
            assert!(message.contains("Match is full"));
        }
        other => panic!("expected Error 409, got {other:?}"),
    }
}

// =========================================================================
// Full games over the wire
// =========================================================================

#[tokio::test]
async fn test_full_game_over_sockets() {
    let addr = start_server().await;

    let mut ws1 = connect(&addr).await;
    let p1 = handshake(&mut ws1, 51).await;
    let match_id = create_match(&mut ws1, 1).await;
    let first = join_match(&mut ws1, 2, match_id).await;
    assert_eq!(first.players.len(), 1);
    assert_eq!(first.current_player, Some(p1.player_id));

    let mut ws2 = connect(&addr).await;
    let p2 = handshake(&mut ws2, 52).await;
    let second = join_match(&mut ws2, 1, match_id).await;
    assert_eq!(second.players.len(), 2);

    // The first player sees the roster fill too.
    let roster = recv_state(&mut ws1).await;
    assert_eq!(roster.players.len(), 2);

    // X sweeps the top row: 0, 1, 2 with O replying 3, 4. Each move is
    // sent only after both sides saw the previous snapshot, so commands
    // arrive in turn order.
    send_move(&mut ws1, 3, 0).await;
    recv_state(&mut ws1).await;
    recv_state(&mut ws2).await;

    send_move(&mut ws2, 2, 3).await;
    recv_state(&mut ws1).await;
    recv_state(&mut ws2).await;

    send_move(&mut ws1, 4, 1).await;
    recv_state(&mut ws1).await;
    recv_state(&mut ws2).await;

    send_move(&mut ws2, 3, 4).await;
    recv_state(&mut ws1).await;
    recv_state(&mut ws2).await;

    send_move(&mut ws1, 5, 2).await;
    let final1 = recv_state(&mut ws1).await;
    let final2 = recv_state(&mut ws2).await;

    assert_eq!(final1, final2);
    assert!(final1.game_over);
    assert_eq!(final1.winner, Some(p1.player_id));
    assert_eq!(final1.current_player, Some(p1.player_id));
    assert_eq!(final1.move_count, 5);
    for cell in 0..3 {
        assert_eq!(final1.board.cell(cell), Some(Mark::X));
    }

    // Either player can start a rematch once the game is over.
    let (op_code, data) = ClientCommand::Reset.encode().expect("encode reset");
    send(&mut ws2, 4, SocketMessage::MatchDataSend { op_code, data }).await;

    let fresh1 = recv_state(&mut ws1).await;
    let fresh2 = recv_state(&mut ws2).await;
    assert_eq!(fresh1, fresh2);
    assert!(!fresh1.game_over);
    assert!(fresh1.board.is_empty());
    assert_eq!(fresh1.move_count, 0);
    assert_eq!(fresh1.players.len(), 2);
    assert!(
        fresh1.current_player == Some(p1.player_id)
            || fresh1.current_player == Some(p2.player_id)
    );
}

#[tokio::test]
async fn test_leave_match_forfeits_live_game() {
    let addr = start_server().await;

    let mut ws1 = connect(&addr).await;
    let p1 = handshake(&mut ws1, 61).await;
    let match_id = create_match(&mut ws1, 1).await;
    join_match(&mut ws1, 2, match_id).await;

    let mut ws2 = connect(&addr).await;
    handshake(&mut ws2, 62).await;
    join_match(&mut ws2, 1, match_id).await;
    recv_state(&mut ws1).await; // roster fill

    send_move(&mut ws1, 3, 4).await;
    recv_state(&mut ws1).await;
    recv_state(&mut ws2).await;

    // The opponent walks out mid-game: the remaining player wins.
    send(&mut ws2, 2, SocketMessage::LeaveMatch).await;

    let forfeit = recv_state(&mut ws1).await;
    assert!(forfeit.game_over);
    assert_eq!(forfeit.winner, Some(p1.player_id));
    assert_eq!(forfeit.current_player, None);
}

#[tokio::test]
async fn test_socket_drop_forfeits_live_game() {
    let addr = start_server().await;

    let mut ws1 = connect(&addr).await;
    let p1 = handshake(&mut ws1, 71).await;
    let match_id = create_match(&mut ws1, 1).await;
    join_match(&mut ws1, 2, match_id).await;

    let mut ws2 = connect(&addr).await;
    handshake(&mut ws2, 72).await;
    join_match(&mut ws2, 1, match_id).await;
    recv_state(&mut ws1).await; // roster fill

    send_move(&mut ws1, 3, 0).await;
    recv_state(&mut ws1).await;
    recv_state(&mut ws2).await;

    // No LeaveMatch, no Disconnect — the socket just goes away.
    ws2.close(None).await.expect("close");

    let forfeit = recv_state(&mut ws1).await;
    assert!(forfeit.game_over);
    assert_eq!(forfeit.winner, Some(p1.player_id));
}
