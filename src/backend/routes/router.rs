/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Health check
 * 2. Chat routes (`/ws`)
 * 3. API routes (`/api/...`)
 * 4. Fallback handler (JSON 404)
 */

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::backend::error::BackendError;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::chat_routes::configure_chat_routes;
use crate::backend::server::state::AppState;
use crate::shared::api::HealthResponse;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));

    let router = configure_chat_routes(router);
    let router = configure_api_routes(router);

    let router = router.fallback(|| async { BackendError::handler(StatusCode::NOT_FOUND, "404 Not Found") });

    router.with_state(app_state)
}

/// Liveness probe with the number of live connections
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: state.broker.connection_count().await,
    })
}
