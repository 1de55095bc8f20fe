//! Group and ride HTTP handlers.
//!
//! Path, query and body rejections are converted to `BackendError`, so a
//! malformed request gets the same JSON error body as a domain failure.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::Identity;
use crate::backend::server::state::AppState;
use crate::shared::api::{CreateGroupRequest, CreateGroupResponse, ListGroupsQuery, ListGroupsResponse, NearbyQuery, SetStatusRequest};
use crate::shared::{GeoPoint, MembershipGroup, RideMatch};

/// Create a group owned by the caller, together with its chat room
pub async fn create_group(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateGroupResponse>), BackendError> {
    let Json(request) = body?;
    let group = state
        .ledger
        .create(identity.user_id(), request.kind, request.max_members, request.attrs())
        .await?;
    let room = state.rooms.resolve_group_room(group.id).await?;
    Ok((StatusCode::CREATED, Json(CreateGroupResponse { group, room })))
}

pub async fn list_groups(
    State(state): State<AppState>,
    query: Result<Query<ListGroupsQuery>, QueryRejection>,
) -> Result<Json<ListGroupsResponse>, BackendError> {
    let Query(filter) = query?;
    let groups = state.ledger.list(&filter).await?;
    Ok(Json(ListGroupsResponse { groups }))
}

pub async fn get_group(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MembershipGroup>, BackendError> {
    let Path(group_id) = path?;
    Ok(Json(state.ledger.get(group_id).await?))
}

pub async fn join_group(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MembershipGroup>, BackendError> {
    let Path(group_id) = path?;
    Ok(Json(state.ledger.join(group_id, identity.user_id()).await?))
}

pub async fn leave_group(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MembershipGroup>, BackendError> {
    let Path(group_id) = path?;
    Ok(Json(state.ledger.leave(group_id, identity.user_id()).await?))
}

/// Owner-only status change
pub async fn set_group_status(
    State(state): State<AppState>,
    identity: Identity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SetStatusRequest>, JsonRejection>,
) -> Result<Json<MembershipGroup>, BackendError> {
    let Path(group_id) = path?;
    let Json(request) = body?;
    Ok(Json(
        state
            .ledger
            .set_status(group_id, identity.user_id(), request.status)
            .await?,
    ))
}

/// Active rides near a point, earliest departure first
pub async fn nearby_rides(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Json<Vec<RideMatch>>, BackendError> {
    let Query(query) = query?;
    let point = GeoPoint {
        lat: query.lat,
        lng: query.lng,
    };
    Ok(Json(state.ledger.nearby_active(point, query.radius).await?))
}
