/**
 * Chat Routes
 *
 * - `GET /ws` - WebSocket upgrade for the real-time protocol. The caller
 *   must be identified by bearer token, `access_token` query parameter or,
 *   in development, `X-User-Id`.
 */

use axum::{routing::get, Router};

use crate::backend::realtime::socket::handle_chat_socket;
use crate::backend::server::state::AppState;

/// Configure real-time routes
pub fn configure_chat_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/ws", get(handle_chat_socket))
}
