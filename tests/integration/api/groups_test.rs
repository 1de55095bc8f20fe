//! Group lifecycle over HTTP

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::assert_error;
use crate::common::{member_ids, TestApp};

fn algorithms_study() -> serde_json::Value {
    json!({ "kind": "project", "max_members": 3, "title": "Algorithms Study" })
}

async fn run_project_scenario(app: TestApp) {
    let created = app.post("/api/groups", "U1", algorithms_study()).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["group"]["status"], "open");
    assert_eq!(member_ids(&created.body["group"]), vec!["U1"]);
    let group_id = created.body["group"]["id"].as_str().unwrap().to_string();
    assert_eq!(created.body["room"]["id"], format!("group:{group_id}"));

    let join = |user: &'static str| {
        let app = &app;
        let uri = format!("/api/groups/{group_id}/join");
        async move { app.post(&uri, user, json!({})).await }
    };

    assert_eq!(join("U2").await.status, StatusCode::OK);
    let third = join("U3").await;
    assert_eq!(third.status, StatusCode::OK);
    assert_eq!(member_ids(&third.body), vec!["U1", "U2", "U3"]);

    assert_error!(join("U4").await, 409, "group_full");
    assert_error!(join("U2").await, 409, "already_member");

    let left = app.post(&format!("/api/groups/{group_id}/leave"), "U2", json!({})).await;
    assert_eq!(left.status, StatusCode::OK);
    assert_eq!(member_ids(&left.body), vec!["U1", "U3"]);

    let fourth = join("U4").await;
    assert_eq!(member_ids(&fourth.body), vec!["U1", "U3", "U4"]);

    let owner_leaves = app.post(&format!("/api/groups/{group_id}/leave"), "U1", json!({})).await;
    assert_error!(owner_leaves, 409, "owner_cannot_leave");

    let fetched = app.get(&format!("/api/groups/{group_id}"), None).await;
    assert_eq!(member_ids(&fetched.body), vec!["U1", "U3", "U4"]);
}

#[tokio::test]
async fn test_project_scenario_memory() {
    run_project_scenario(TestApp::memory()).await;
}

#[tokio::test]
async fn test_project_scenario_sqlite() {
    run_project_scenario(TestApp::sqlite().await).await;
}

#[tokio::test]
async fn test_create_validation() {
    let app = TestApp::memory();

    let zero = app
        .post("/api/groups", "U1", json!({ "kind": "project", "max_members": 0, "title": "T" }))
        .await;
    assert_error!(zero, 400, "invalid_capacity");

    let ride_without_details = app
        .post("/api/groups", "U1", json!({ "kind": "ride", "max_members": 3, "title": "Airport" }))
        .await;
    assert_error!(ride_without_details, 400, "validation");

    let bad_coordinates = app
        .post(
            "/api/groups",
            "U1",
            json!({
                "kind": "ride",
                "max_members": 3,
                "title": "Airport",
                "ride": {
                    "origin": { "lat": 91.0, "lng": 0.0 },
                    "destination": { "lat": 0.0, "lng": 0.0 },
                    "departure_time": (Utc::now() + Duration::hours(2)).to_rfc3339(),
                }
            }),
        )
        .await;
    assert_error!(bad_coordinates, 400, "invalid_coordinates");

    let malformed = app.post("/api/groups", "U1", json!({ "kind": "spaceship" })).await;
    assert_eq!(malformed.status.as_u16() / 100, 4);
}

#[tokio::test]
async fn test_status_changes_are_owner_only() {
    let app = TestApp::memory();
    let group_id = app.create_group("owner", algorithms_study()).await;
    let uri = format!("/api/groups/{group_id}/status");

    let by_stranger = app
        .request(Method::PUT, &uri, Some("mallory"), Some(json!({ "status": "completed" })))
        .await;
    assert_error!(by_stranger, 403, "not_owner");

    let started = app
        .request(Method::PUT, &uri, Some("owner"), Some(json!({ "status": "in_progress" })))
        .await;
    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.body["status"], "in_progress");

    let wrong_kind = app
        .request(Method::PUT, &uri, Some("owner"), Some(json!({ "status": "archived" })))
        .await;
    assert_error!(wrong_kind, 409, "invalid_status_transition");

    let done = app
        .request(Method::PUT, &uri, Some("owner"), Some(json!({ "status": "completed" })))
        .await;
    assert_eq!(done.body["status"], "completed");

    let late = app.post(&format!("/api/groups/{group_id}/join"), "U9", json!({})).await;
    assert_error!(late, 409, "group_closed");
}

#[tokio::test]
async fn test_malformed_path_and_query_get_json_errors() {
    let app = TestApp::memory();

    assert_error!(app.get("/api/groups/not-a-uuid", None).await, 400, "bad_request");
    assert_error!(
        app.post("/api/groups/not-a-uuid/join", "U1", json!({})).await,
        400,
        "bad_request"
    );
    assert_error!(app.get("/api/groups?kind=spaceship", None).await, 400, "bad_request");
    assert_error!(app.get("/api/rides/nearby?lat=north&lng=0&radius=10", None).await, 400, "bad_request");
    assert_error!(app.get("/api/rides/nearby?lat=0&lng=0", None).await, 400, "bad_request");
}

#[tokio::test]
async fn test_unknown_group_is_404() {
    let app = TestApp::memory();
    let missing = uuid::Uuid::new_v4();
    assert_error!(app.get(&format!("/api/groups/{missing}"), None).await, 404, "unknown_group");
    assert_error!(
        app.post(&format!("/api/groups/{missing}/join"), "U1", json!({})).await,
        404,
        "unknown_group"
    );
}

#[tokio::test]
async fn test_list_filters_and_nearby_rides() {
    let app = TestApp::memory();
    app.create_group("U1", algorithms_study()).await;
    let departure = (Utc::now() + Duration::hours(3)).to_rfc3339();
    let ride_id = app
        .create_group(
            "driver",
            json!({
                "kind": "ride",
                "max_members": 4,
                "title": "Campus to station",
                "ride": {
                    "origin": { "lat": 51.7520, "lng": -1.2577 },
                    "destination": { "lat": 51.7535, "lng": -1.2700 },
                    "departure_time": departure,
                }
            }),
        )
        .await;

    let rides = app.get("/api/groups?kind=ride", None).await;
    let groups = rides.body["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["id"], ride_id);

    let owned = app.get("/api/groups?owner=U1", None).await;
    assert_eq!(owned.body["groups"].as_array().unwrap().len(), 1);

    let near = app.get("/api/rides/nearby?lat=51.7525&lng=-1.2580&radius=1000", None).await;
    assert_eq!(near.status, StatusCode::OK);
    let matches = near.body.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["group"]["id"], ride_id);

    let far = app.get("/api/rides/nearby?lat=48.8566&lng=2.3522&radius=1000", None).await;
    assert_eq!(far.body, json!([]));
}
