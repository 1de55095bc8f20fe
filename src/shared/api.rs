//! HTTP request and response bodies.
//!
//! Group bodies use snake_case like the group records themselves; message
//! bodies use camelCase like the real-time frames.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::group::{GroupAttrs, GroupFilter, GroupKind, GroupStatus, MembershipGroup, RideDetails};
use crate::shared::message::{Message, SenderInfo};
use crate::shared::room::{Room, RoomId};

/// `POST /api/groups`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateGroupRequest {
    pub kind: GroupKind,
    pub max_members: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ride: Option<RideDetails>,
}

impl CreateGroupRequest {
    pub fn attrs(&self) -> GroupAttrs {
        GroupAttrs {
            title: self.title.clone(),
            description: self.description.clone(),
            ride: self.ride.clone(),
        }
    }
}

/// A group together with its chat room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateGroupResponse {
    pub group: MembershipGroup,
    pub room: Room,
}

/// `GET /api/groups` query string
pub type ListGroupsQuery = GroupFilter;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListGroupsResponse {
    pub groups: Vec<MembershipGroup>,
}

/// `PUT /api/groups/{id}/status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetStatusRequest {
    pub status: GroupStatus,
}

/// `GET /api/rides/nearby` query string
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    /// Meters
    pub radius: f64,
}

/// `POST /api/rooms/resolve`. A direct room is always between the caller
/// and `other_user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveRoomRequest {
    Direct { other_user_id: String },
    Group { group_id: Uuid },
    Contextual { context_key: String },
}

/// `POST /api/rooms/{room_id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub content: String,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub client_time: Option<String>,
    /// Display name and avatar; the id is always the caller's
    #[serde(default)]
    pub sender: Option<SenderInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageResponse {
    pub message: Message,
    /// Live connections the message was relayed to
    pub delivered: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub room_id: RoomId,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
}
