/**
 * API Routes
 *
 * Group, ride, room and message endpoints. Routes that require an identity
 * take the `Identity` extractor in their handler; the rest are open for
 * anonymous reads.
 */

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::backend::ledger::handlers::{
    create_group, get_group, join_group, leave_group, list_groups, nearby_rides, set_group_status,
};
use crate::backend::messages::handlers::{get_history, post_message};
use crate::backend::rooms::handlers::resolve_room;
use crate::backend::server::state::AppState;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Membership ledger
        .route("/api/groups", post(create_group).get(list_groups))
        .route("/api/groups/{id}", get(get_group))
        .route("/api/groups/{id}/join", post(join_group))
        .route("/api/groups/{id}/leave", post(leave_group))
        .route("/api/groups/{id}/status", put(set_group_status))
        .route("/api/rides/nearby", get(nearby_rides))
        // Rooms and messages
        .route("/api/rooms/resolve", post(resolve_room))
        .route("/api/rooms/{room_id}/messages", get(get_history).post(post_message))
}
