//! Sessions and HTTP sharing one broker and one message log

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio::time::timeout;

use studyhub::backend::realtime::{ChatSession, SessionState};
use studyhub::shared::{RoomId, ServerEvent};

use crate::common::TestApp;

async fn next_event(outbox: &mut tokio::sync::mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_secs(1), outbox.recv())
        .await
        .expect("event within a second")
        .expect("outbox open")
}

fn join_frame(room_id: &str) -> String {
    json!({ "event": "join-room", "data": { "roomId": room_id } }).to_string()
}

#[tokio::test]
async fn test_http_post_reaches_joined_sessions() {
    let app = TestApp::memory();
    let room = app
        .post("/api/rooms/resolve", "ana", json!({ "kind": "direct", "other_user_id": "ben" }))
        .await;
    let room_id = room.body["id"].as_str().unwrap().to_string();

    let (mut ben, mut ben_outbox) = ChatSession::open(app.state.session_context(), "ben").await.unwrap();
    let replies = ben.handle_text(&join_frame(&room_id)).await;
    assert_eq!(replies, vec![ServerEvent::RoomJoined { room_id: RoomId::from(room_id.clone()) }]);
    assert_eq!(ben.state(), SessionState::RoomJoined);

    let posted = app
        .post(
            &format!("/api/rooms/{room_id}/messages"),
            "ana",
            json!({ "content": "are you driving tomorrow?" }),
        )
        .await;
    assert_eq!(posted.status, StatusCode::CREATED);
    assert_eq!(posted.body["delivered"], 1);

    match next_event(&mut ben_outbox).await {
        ServerEvent::ReceiveMessage(payload) => {
            assert_eq!(payload.sender.id, "ana");
            assert_eq!(payload.seq, 1);
            assert_eq!(payload.content, "are you driving tomorrow?");
        }
        other => panic!("expected receive-message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_socket_messages_land_in_history() {
    let app = TestApp::sqlite().await;
    let room = app
        .post("/api/rooms/resolve", "ana", json!({ "kind": "contextual", "context_key": "ride-7" }))
        .await;
    let room_id = room.body["id"].as_str().unwrap().to_string();

    let (mut ana, mut ana_outbox) = ChatSession::open(app.state.session_context(), "ana").await.unwrap();
    let (mut ben, mut ben_outbox) = ChatSession::open(app.state.session_context(), "ben").await.unwrap();
    ana.handle_text(&join_frame(&room_id)).await;
    ben.handle_text(&join_frame(&room_id)).await;

    let send = json!({
        "event": "send-message",
        "data": { "roomId": room_id, "content": "leaving at 8", "sender": { "id": "someone-else" } }
    });
    assert!(ana.handle_text(&send.to_string()).await.is_empty());

    match next_event(&mut ben_outbox).await {
        ServerEvent::ReceiveMessage(payload) => assert_eq!(payload.sender.id, "ana"),
        other => panic!("expected receive-message, got {other:?}"),
    }
    // the sender is not echoed
    assert!(ana_outbox.try_recv().is_err());

    let history = app.get(&format!("/api/rooms/{room_id}/messages"), Some("ben")).await;
    let messages = history.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["senderId"], "ana");
}

#[tokio::test]
async fn test_health_counts_live_sessions() {
    let app = TestApp::memory();
    let (mut first, _first_outbox) = ChatSession::open(app.state.session_context(), "ana").await.unwrap();
    let (_second, _second_outbox) = ChatSession::open(app.state.session_context(), "ben").await.unwrap();
    assert_eq!(app.get("/health", None).await.body["connections"], 2);

    first.close().await;
    assert_eq!(first.state(), SessionState::Disconnected);
    assert_eq!(app.get("/health", None).await.body["connections"], 1);
}

#[tokio::test]
async fn test_socket_upgrade_requires_identity() {
    let app = TestApp::memory();
    let response = app.get("/ws", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
