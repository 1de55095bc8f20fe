//! Room resolution over HTTP

use axum::http::StatusCode;
use serde_json::json;

use crate::assert_error;
use crate::common::TestApp;

#[tokio::test]
async fn test_direct_room_is_shared_by_both_participants() {
    let app = TestApp::memory();

    let from_alice = app
        .post("/api/rooms/resolve", "alice", json!({ "kind": "direct", "other_user_id": "bob" }))
        .await;
    let from_bob = app
        .post("/api/rooms/resolve", "bob", json!({ "kind": "direct", "other_user_id": "alice" }))
        .await;

    assert_eq!(from_alice.status, StatusCode::OK);
    assert_eq!(from_alice.body["id"], "dm:alice:bob");
    assert_eq!(from_alice.body, from_bob.body);
}

#[tokio::test]
async fn test_direct_room_with_self_is_rejected() {
    let app = TestApp::memory();
    let response = app
        .post("/api/rooms/resolve", "alice", json!({ "kind": "direct", "other_user_id": "alice" }))
        .await;
    assert_error!(response, 400, "validation");
}

#[tokio::test]
async fn test_group_room_requires_existing_group() {
    let app = TestApp::memory();
    let missing = app
        .post(
            "/api/rooms/resolve",
            "alice",
            json!({ "kind": "group", "group_id": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_error!(missing, 404, "unknown_group");

    let group_id = app
        .create_group("alice", json!({ "kind": "chat_group", "max_members": 8, "title": "Study Hall" }))
        .await;
    let room = app
        .post("/api/rooms/resolve", "bob", json!({ "kind": "group", "group_id": group_id }))
        .await;
    assert_eq!(room.status, StatusCode::OK);
    assert_eq!(room.body["id"], format!("group:{group_id}"));
}

#[tokio::test]
async fn test_contextual_room_is_idempotent() {
    let app = TestApp::sqlite().await;
    let first = app
        .post("/api/rooms/resolve", "alice", json!({ "kind": "contextual", "context_key": "ride-42" }))
        .await;
    let second = app
        .post("/api/rooms/resolve", "carol", json!({ "kind": "contextual", "context_key": "ride-42" }))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
}
