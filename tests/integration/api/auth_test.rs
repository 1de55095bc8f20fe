//! Identity extraction over HTTP

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::assert_error;
use crate::common::TestApp;

#[tokio::test]
async fn test_mutations_require_identity() {
    let app = TestApp::memory();

    let response = app
        .request(
            Method::POST,
            "/api/groups",
            None,
            Some(json!({ "kind": "project", "max_members": 3, "title": "Compilers" })),
        )
        .await;
    assert_error!(response, 401, "unauthorized");

    let response = app.get("/api/rooms/dm:a:b/messages", None).await;
    assert_error!(response, 401, "unauthorized");
}

#[tokio::test]
async fn test_bearer_token_identifies_caller() {
    let app = TestApp::memory();
    let group_id = app
        .create_group("owner", json!({ "kind": "chat_group", "max_members": 5, "title": "Rust Club" }))
        .await;

    let response = app
        .request_with_token(Method::POST, &format!("/api/groups/{group_id}/join"), "token-user")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(crate::common::member_ids(&response.body).contains(&"token-user".to_string()));
}

#[tokio::test]
async fn test_public_reads_need_no_identity() {
    let app = TestApp::memory();
    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");
    assert_eq!(health.body["connections"], 0);

    let list = app.get("/api/groups", None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["groups"], json!([]));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::memory();
    let response = app.get("/api/nope", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["status"], 404);
}
