//! Message HTTP handlers.
//!
//! Posting over HTTP has the same effect as `send-message` on a socket: the
//! message is appended, then relayed live to every connection in the room.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::Identity;
use crate::backend::realtime::publish_message;
use crate::backend::server::state::AppState;
use crate::shared::api::{HistoryResponse, PostMessageRequest, PostMessageResponse};
use crate::shared::{NewMessage, RoomId, SenderInfo};

pub async fn get_history(
    State(state): State<AppState>,
    _identity: Identity,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<HistoryResponse>, BackendError> {
    let Path(room_id) = path?;
    let room_id = RoomId::from(room_id);
    let messages = state.messages.history(&room_id).await?;
    Ok(Json(HistoryResponse { room_id, messages }))
}

pub async fn post_message(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<PostMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostMessageResponse>), BackendError> {
    let Path(room_id) = path?;
    let Json(request) = body?;

    let mut message = NewMessage::new(RoomId::from(room_id), identity.user_id(), request.content);
    if let Some(receiver) = request.receiver {
        message = message.with_receiver(receiver);
    }
    if let Some(client_time) = request.client_time {
        message = message.with_client_time(client_time);
    }

    let stored = state.messages.append(message).await?;
    let sender = request.sender.unwrap_or_else(|| SenderInfo::anonymous(identity.user_id()));
    let delivered = publish_message(state.broker.as_ref(), &stored, sender, None).await;

    Ok((
        StatusCode::CREATED,
        Json(PostMessageResponse {
            message: stored,
            delivered,
        }),
    ))
}
