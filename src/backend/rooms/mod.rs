//! Room Registry
//!
//! Resolves the three kinds of room key to stable room ids and records the
//! rooms on first use. Every resolve is an idempotent get-or-create: the
//! first caller creates the room, later callers get the stored one back.
//!
//! Direct rooms are keyed by the sorted participant pair, so
//! `resolve_direct_room(a, b)` and `resolve_direct_room(b, a)` always meet in
//! the same room.

/// HTTP handlers
pub mod handlers;

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::storage::{GroupStore, RoomStore};
use crate::shared::{CoreError, Room, RoomId, RoomKey};

#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<dyn RoomStore>,
    groups: Arc<dyn GroupStore>,
}

impl RoomRegistry {
    pub fn new(rooms: Arc<dyn RoomStore>, groups: Arc<dyn GroupStore>) -> Self {
        Self { rooms, groups }
    }

    pub async fn resolve_direct_room(&self, user_a: &str, user_b: &str) -> BackendResult<Room> {
        self.resolve(RoomKey::direct(user_a, user_b)?).await
    }

    /// Group chat room; the group must exist
    pub async fn resolve_group_room(&self, group_id: Uuid) -> BackendResult<Room> {
        if self.groups.get_group(group_id).await?.is_none() {
            return Err(CoreError::UnknownGroup { group_id }.into());
        }
        self.resolve(RoomKey::group(group_id)).await
    }

    pub async fn resolve_contextual_room(&self, context_key: &str) -> BackendResult<Room> {
        self.resolve(RoomKey::contextual(context_key)?).await
    }

    /// Resolve any validated key. Group keys are checked like
    /// `resolve_group_room`.
    pub async fn resolve_key(&self, key: RoomKey) -> BackendResult<Room> {
        match key {
            RoomKey::Group { group_id } => self.resolve_group_room(group_id).await,
            RoomKey::Direct { user_a, user_b } => self.resolve_direct_room(&user_a, &user_b).await,
            RoomKey::Contextual { context_key } => self.resolve_contextual_room(&context_key).await,
        }
    }

    pub async fn get(&self, room_id: &RoomId) -> BackendResult<Room> {
        self.rooms.get_room(room_id).await?.ok_or_else(|| {
            CoreError::UnknownRoom {
                room_id: room_id.clone(),
            }
            .into()
        })
    }

    async fn resolve(&self, key: RoomKey) -> BackendResult<Room> {
        let room = self.rooms.get_or_create_room(Room::from_key(key)).await?;
        tracing::debug!("[Rooms] Resolved {} room {}", room.kind.as_str(), room.id);
        Ok(room)
    }
}
