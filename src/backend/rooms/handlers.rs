//! Room HTTP handlers.

use axum::{extract::State, Json};

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::Identity;
use crate::backend::rooms::RoomRegistry;
use crate::shared::api::ResolveRoomRequest;
use crate::shared::Room;

/// Resolve (creating on first use) a direct, group or contextual room
pub async fn resolve_room(
    State(rooms): State<RoomRegistry>,
    identity: Identity,
    body: Result<Json<ResolveRoomRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Room>, BackendError> {
    let Json(request) = body?;
    let room = match request {
        ResolveRoomRequest::Direct { other_user_id } => {
            rooms.resolve_direct_room(identity.user_id(), &other_user_id).await?
        }
        ResolveRoomRequest::Group { group_id } => rooms.resolve_group_room(group_id).await?,
        ResolveRoomRequest::Contextual { context_key } => rooms.resolve_contextual_room(&context_key).await?,
    };
    Ok(Json(room))
}
