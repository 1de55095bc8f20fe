//! Message posting and history over HTTP

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;
use crate::{assert_contains, assert_error};

async fn direct_room(app: &TestApp) -> String {
    let room = app
        .post("/api/rooms/resolve", "A", json!({ "kind": "direct", "other_user_id": "B" }))
        .await;
    room.body["id"].as_str().unwrap().to_string()
}

async fn run_history_scenario(app: TestApp) {
    let room_id = direct_room(&app).await;
    let uri = format!("/api/rooms/{room_id}/messages");

    // A's clock is ahead of B's; the server order is arrival order
    let hi = app
        .post(&uri, "A", json!({ "content": "Hi", "clientTime": "2024-03-01T10:05:00Z" }))
        .await;
    assert_eq!(hi.status, StatusCode::CREATED);
    assert_eq!(hi.body["message"]["seq"], 1);
    assert_eq!(hi.body["delivered"], 0);

    let hello = app
        .post(&uri, "B", json!({ "content": "Hello", "clientTime": "2024-03-01T10:01:00Z" }))
        .await;
    assert_eq!(hello.body["message"]["seq"], 2);

    let history = app.get(&uri, Some("A")).await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body["roomId"], room_id);
    let lines: Vec<(String, String)> = history.body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| {
            (
                m["senderId"].as_str().unwrap().to_string(),
                m["content"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        lines,
        vec![("A".to_string(), "Hi".to_string()), ("B".to_string(), "Hello".to_string())]
    );
}

#[tokio::test]
async fn test_history_is_arrival_ordered_memory() {
    run_history_scenario(TestApp::memory()).await;
}

#[tokio::test]
async fn test_history_is_arrival_ordered_sqlite() {
    run_history_scenario(TestApp::sqlite().await).await;
}

#[tokio::test]
async fn test_sender_is_always_the_caller() {
    let app = TestApp::memory();
    let room_id = direct_room(&app).await;
    let posted = app
        .post(
            &format!("/api/rooms/{room_id}/messages"),
            "A",
            json!({ "content": "it's me", "sender": { "id": "B", "displayName": "Not B" } }),
        )
        .await;
    assert_eq!(posted.status, StatusCode::CREATED);
    assert_eq!(posted.body["message"]["senderId"], "A");
}

#[tokio::test]
async fn test_message_errors() {
    let app = TestApp::memory();
    let room_id = direct_room(&app).await;
    let uri = format!("/api/rooms/{room_id}/messages");

    assert_error!(app.post(&uri, "A", json!({ "content": "   " })).await, 400, "validation");

    let too_long = app.post(&uri, "A", json!({ "content": "x".repeat(201) })).await;
    assert_error!(too_long, 400, "validation");
    assert_contains!(too_long.body["error"].as_str().unwrap(), "200");

    let unknown = app
        .post("/api/rooms/topic:nowhere/messages", "A", json!({ "content": "hello?" }))
        .await;
    assert_error!(unknown, 404, "unknown_room");
    assert_error!(app.get("/api/rooms/topic:nowhere/messages", Some("A")).await, 404, "unknown_room");
}
