//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use arena::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const WAIT: Duration = Duration::from_secs(5);

/// Starts a server on a random port with a seeded world.
async fn start_server(builder: ArenaServerBuilder) -> (String, ArenaHandle) {
    let server = builder
        .bind("127.0.0.1:0")
        .world(World::with_seed(GameConfig::default(), 7))
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let arena = server.arena().clone();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, arena)
}

/// Connects and waits until the server has registered the session, so the
/// client is guaranteed to see broadcasts from here on.
async fn connect(addr: &str) -> ClientWs {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    send(&mut ws, json!({"event": "heartbeat", "data": {"clientTime": 1}})).await;
    next_named(&mut ws, "heartbeat-ack").await;
    ws
}

async fn send(ws: &mut ClientWs, frame: serde_json::Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send");
}

async fn join(ws: &mut ClientWs, name: &str) -> PlayerId {
    send(
        ws,
        json!({"event": "join-game", "data": {"name": name, "character": "panda"}}),
    )
    .await;
    let ServerEvent::GameJoined(joined) = next_named(ws, "game-joined").await else {
        unreachable!();
    };
    joined.player_id
}

/// Reads frames until a server event named `name` arrives.
async fn next_named(ws: &mut ClientWs, name: &str) -> ServerEvent {
    tokio::time::timeout(WAIT, async {
        loop {
            let msg = ws
                .next()
                .await
                .expect("connection closed")
                .expect("recv failed");
            let Message::Text(text) = msg else {
                continue;
            };
            let event: ServerEvent = serde_json::from_str(text.as_str()).expect("decode");
            if event.name() == name {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

/// Reads until the server closes the connection.
async fn wait_closed(ws: &mut ClientWs) {
    tokio::time::timeout(WAIT, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("server should close the connection");
}

// =========================================================================
// Connection events
// =========================================================================

#[tokio::test]
async fn test_heartbeat_echoes_client_time() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({"event": "heartbeat", "data": {"clientTime": 1234}})).await;
    let ServerEvent::HeartbeatAck(ack) = next_named(&mut ws, "heartbeat-ack").await else {
        unreachable!();
    };
    assert_eq!(ack.client_time, 1234);
    assert!(ack.server_time > 0);
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    send(&mut ws, json!({"event": "warp-drive", "data": {}})).await;
    send(&mut ws, json!({"event": "player-move", "data": {"position": 3}})).await;

    // Still connected and still answered.
    send(&mut ws, json!({"event": "heartbeat", "data": {"clientTime": 9}})).await;
    let ServerEvent::HeartbeatAck(ack) = next_named(&mut ws, "heartbeat-ack").await else {
        unreachable!();
    };
    assert_eq!(ack.client_time, 9);
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_reaches_joiner_and_lobby() {
    let (addr, arena) = start_server(ArenaServer::builder()).await;
    let mut lobby = connect(&addr).await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        json!({"event": "join-game", "data": {"name": "  Ada  ", "character": "fox"}}),
    )
    .await;

    let ServerEvent::GameJoined(joined) = next_named(&mut ws, "game-joined").await else {
        unreachable!();
    };
    assert_eq!(joined.config, GameConfig::default());
    assert_eq!(joined.players.len(), 1);
    assert_eq!(joined.players[0].name, "Ada");
    assert_eq!(joined.players[0].character, "fox");
    assert_eq!(joined.players[0].health, 100);

    let ServerEvent::PlayerJoined(snapshot) = next_named(&mut lobby, "player-joined").await
    else {
        unreachable!();
    };
    assert_eq!(snapshot.id, joined.player_id);

    let info = arena.info().await.unwrap();
    assert_eq!(info.sessions, 2);
    assert_eq!(info.players, 1);
}

#[tokio::test]
async fn test_blank_name_join_is_dropped() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        json!({"event": "join-game", "data": {"name": "   ", "character": "fox"}}),
    )
    .await;
    send(
        &mut ws,
        json!({"event": "join-game", "data": {"name": "Ada", "character": "fox"}}),
    )
    .await;

    let ServerEvent::GameJoined(joined) = next_named(&mut ws, "game-joined").await else {
        unreachable!();
    };
    assert_eq!(joined.players.len(), 1);
    assert_eq!(joined.players[0].name, "Ada");
}

#[tokio::test]
async fn test_long_name_is_truncated_and_character_is_optional() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ws = connect(&addr).await;

    let long = "x".repeat(40);
    send(&mut ws, json!({"event": "join-game", "data": {"name": long}})).await;

    let ServerEvent::GameJoined(joined) = next_named(&mut ws, "game-joined").await else {
        unreachable!();
    };
    assert_eq!(joined.players[0].name.chars().count(), 20);
    assert_eq!(joined.players[0].character, "");
}

#[tokio::test]
async fn test_second_join_is_ignored() {
    let (addr, arena) = start_server(ArenaServer::builder()).await;
    let mut ws = connect(&addr).await;
    let ada = join(&mut ws, "Ada").await;

    send(
        &mut ws,
        json!({"event": "join-game", "data": {"name": "Eve", "character": "fox"}}),
    )
    .await;
    send(&mut ws, json!({"event": "chat-message", "data": {"message": "hi"}})).await;

    let ServerEvent::ChatMessage(line) = next_named(&mut ws, "chat-message").await else {
        unreachable!();
    };
    assert_eq!(line.player_id, ada);
    assert_eq!(line.player_name, "Ada");
    assert_eq!(arena.info().await.unwrap().players, 1);
}

// =========================================================================
// Gameplay
// =========================================================================

#[tokio::test]
async fn test_events_before_join_are_dropped() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ada = connect(&addr).await;
    join(&mut ada, "Ada").await;

    let mut bob = connect(&addr).await;
    send(&mut bob, json!({"event": "chat-message", "data": {"message": "first"}})).await;
    let bob_id = join(&mut bob, "Bob").await;
    send(&mut bob, json!({"event": "chat-message", "data": {"message": "second"}})).await;

    let ServerEvent::ChatMessage(line) = next_named(&mut ada, "chat-message").await else {
        unreachable!();
    };
    assert_eq!(line.player_id, bob_id);
    assert_eq!(line.message, "second");
}

#[tokio::test]
async fn test_shot_is_announced_to_everyone() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ada = connect(&addr).await;
    let mut bob = connect(&addr).await;
    let ada_id = join(&mut ada, "Ada").await;
    join(&mut bob, "Bob").await;

    send(
        &mut ada,
        json!({"event": "player-shoot", "data": {
            "position": {"x": 0.0, "y": 5.0, "z": 0.0},
            "direction": {"x": 0.0, "y": 0.0, "z": 1.0},
            "id": "rocket-1"
        }}),
    )
    .await;

    for ws in [&mut ada, &mut bob] {
        let ServerEvent::ProjectileFired(fired) = next_named(ws, "projectile-fired").await else {
            unreachable!();
        };
        assert_eq!(fired.player_id, ada_id);
        assert_eq!(fired.id.as_str(), "rocket-1");
        assert_eq!(fired.direction, DVec3::Z);
    }
}

#[tokio::test]
async fn test_movement_is_relayed_to_others() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ada = connect(&addr).await;
    let mut bob = connect(&addr).await;
    let ada_id = join(&mut ada, "Ada").await;
    join(&mut bob, "Bob").await;

    send(
        &mut ada,
        json!({"event": "player-move", "data": {
            "position": {"x": 1.0, "y": 2.0, "z": 3.0},
            "rotation": {"x": 0.0, "y": 1.5, "z": 0.0},
            "isCrouching": true
        }}),
    )
    .await;

    let ServerEvent::PlayerMoved(moved) = next_named(&mut bob, "player-moved").await else {
        unreachable!();
    };
    assert_eq!(moved.id, ada_id);
    assert_eq!(moved.position, DVec3::new(1.0, 2.0, 3.0));
    assert!(moved.is_crouching);
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test]
async fn test_disconnect_event_notifies_others() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;
    let mut ada = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut ada, "Ada").await;
    let bob_id = join(&mut bob, "Bob").await;

    send(&mut bob, json!({"event": "disconnect"})).await;

    let ServerEvent::PlayerLeft(left) = next_named(&mut ada, "player-left").await else {
        unreachable!();
    };
    assert_eq!(left, bob_id);
    wait_closed(&mut bob).await;
}

#[tokio::test]
async fn test_closed_socket_notifies_others() {
    let (addr, arena) = start_server(ArenaServer::builder()).await;
    let mut ada = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut ada, "Ada").await;
    let bob_id = join(&mut bob, "Bob").await;

    bob.close(None).await.unwrap();

    let ServerEvent::PlayerLeft(left) = next_named(&mut ada, "player-left").await else {
        unreachable!();
    };
    assert_eq!(left, bob_id);
    let info = arena.info().await.unwrap();
    assert_eq!(info.sessions, 1);
    assert_eq!(info.players, 1);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let builder = ArenaServer::builder().idle_timeout(Some(Duration::from_millis(200)));
    let (addr, _arena) = start_server(builder).await;
    let mut ws = connect(&addr).await;

    wait_closed(&mut ws).await;
}

#[tokio::test]
async fn test_silent_socket_does_not_block_other_clients() {
    let (addr, _arena) = start_server(ArenaServer::builder()).await;

    // Connected at the TCP level, never sends an upgrade request.
    let _silent = tokio::net::TcpStream::connect(&addr).await.expect("tcp connect");

    let connected = tokio::time::timeout(
        Duration::from_secs(3),
        tokio_tungstenite::connect_async(format!("ws://{addr}")),
    )
    .await
    .expect("a stalled handshake must not hold up the accept loop");
    let (mut ws, _) = connected.expect("should connect");

    send(&mut ws, json!({"event": "heartbeat", "data": {"clientTime": 5}})).await;
    next_named(&mut ws, "heartbeat-ack").await;
}

#[tokio::test]
async fn test_silent_socket_is_dropped_after_handshake_timeout() {
    use tokio::io::AsyncReadExt;

    let builder = ArenaServer::builder().handshake_timeout(Duration::from_millis(200));
    let (addr, _arena) = start_server(builder).await;

    let mut silent = tokio::net::TcpStream::connect(&addr).await.expect("tcp connect");
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(WAIT, silent.read(&mut buf))
        .await
        .expect("server should drop the socket");
    assert!(matches!(read, Ok(0) | Err(_)), "expected EOF, got {read:?}");
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_run_until_stops_the_arena() {
    let server = ArenaServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let arena = server.arena().clone();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));
    stop_tx.send(()).unwrap();

    tokio::time::timeout(WAIT, running)
        .await
        .expect("server should stop")
        .expect("task should not panic")
        .expect("shutdown should succeed");

    tokio::time::timeout(WAIT, async {
        while !arena.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("arena should stop");
}
