/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server.
 *
 * # Initialization Process
 *
 * 1. Validate configuration
 * 2. Open storage (SQLite when `database_url` is set, in-memory otherwise)
 * 3. Wire the ledger, room registry, message log and broker into `AppState`
 * 4. Create the router and add tracing and CORS layers
 */

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_stores;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// Create and configure the Axum application
///
/// # Errors
///
/// Fails only when the configuration itself is invalid. Storage problems
/// are logged and the server falls back to in-memory storage.
pub async fn create_app(config: AppConfig) -> Result<Router<()>, BackendError> {
    tracing::info!("Initializing StudyHub backend server");

    config.validate().map_err(|e| {
        BackendError::handler(axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    if config.dev_auth_bypass {
        tracing::warn!("DEV_AUTH_BYPASS is on: X-User-Id is trusted without a token");
    }

    let stores = load_stores(&config).await;
    let app_state = AppState::new(config, stores);
    tracing::info!("Services and broker initialized");

    Ok(build_router(app_state))
}

/// Router over an existing state, with the HTTP layers applied
pub fn build_router(app_state: AppState) -> Router<()> {
    create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
