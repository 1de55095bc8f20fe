//! In-process test application
//!
//! Wraps `axum_test::TestServer` around the full router over in-memory or
//! SQLite storage. Requests identify their caller with the dev header or a
//! signed bearer token.

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, Method, StatusCode};
use axum_test::{TestRequest, TestServer};
use chrono::Duration;
use serde_json::Value;

use studyhub::backend::middleware::{issue_token, DEV_USER_HEADER};
use studyhub::backend::server::{build_router, AppState};
use studyhub::backend::storage::{SqliteStorage, Stores};
use studyhub::shared::AppConfig;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Decoded response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestApp {
    pub state: AppState,
    pub server: TestServer,
}

pub fn test_config() -> AppConfig {
    AppConfig::builder()
        .jwt_secret(TEST_SECRET)
        .dev_auth_bypass(true)
        .max_message_chars(200)
        .build()
        .expect("test config is valid")
}

pub fn bearer_token(user: &str) -> String {
    issue_token(TEST_SECRET, user, Duration::minutes(5)).expect("token")
}

impl TestApp {
    pub fn memory() -> Self {
        Self::with_stores(Stores::memory())
    }

    pub async fn sqlite() -> Self {
        let storage = SqliteStorage::in_memory().await.expect("in-memory sqlite");
        Self::with_stores(Stores::sqlite(storage))
    }

    fn with_stores(stores: Stores) -> Self {
        let state = AppState::new(test_config(), stores);
        let server = TestServer::new(build_router(state.clone())).expect("test server");
        Self { state, server }
    }

    /// Send a request as `user` (via the dev header); `None` sends no identity
    pub async fn request(&self, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut request = self.server.method(method, uri);
        if let Some(user) = user {
            request = request.add_header(
                HeaderName::from_static(DEV_USER_HEADER),
                HeaderValue::from_str(user).expect("header value"),
            );
        }
        if let Some(json) = body {
            request = request.json(&json);
        }
        decode(request).await
    }

    /// Send a request authenticated with a signed bearer token
    pub async fn request_with_token(&self, method: Method, uri: &str, user: &str) -> TestResponse {
        let request = self.server.method(method, uri).add_header(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer_token(user))).expect("header value"),
        );
        decode(request).await
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    /// Create a group owned by `owner` and return its id
    pub async fn create_group(&self, owner: &str, body: Value) -> String {
        let response = self.post("/api/groups", owner, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "create failed: {}", response.body);
        response.body["group"]["id"].as_str().expect("group id").to_string()
    }
}

async fn decode(request: TestRequest) -> TestResponse {
    let response = request.await;
    let text = response.text();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    TestResponse {
        status: response.status_code(),
        body,
    }
}

/// Member ids of a group body, in join order
pub fn member_ids(group: &Value) -> Vec<String> {
    group["members"]
        .as_array()
        .map(|members| {
            members
                .iter()
                .filter_map(|m| m["user_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
