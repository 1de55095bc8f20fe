//! In-memory storage backend.
//!
//! Each table sits behind its own `tokio::sync::RwLock`. Conditional writes
//! take the write lock for the full check-and-mutate, which is what makes
//! them atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    GroupStore, JoinOutcome, LeaveOutcome, MessageStore, RoomStore, StatusOutcome, StorageError,
    StorageResult,
};
use crate::shared::group::{GroupFilter, GroupStatus, Member, MemberRole, MembershipGroup};
use crate::shared::message::{Message, NewMessage};
use crate::shared::room::{Room, RoomId};

#[derive(Default)]
struct GroupTable {
    /// Creation order
    order: Vec<Uuid>,
    by_id: HashMap<Uuid, MembershipGroup>,
}

#[derive(Default)]
pub struct MemoryStorage {
    groups: RwLock<GroupTable>,
    rooms: RwLock<HashMap<RoomId, Room>>,
    messages: RwLock<HashMap<RoomId, Vec<Message>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupStore for MemoryStorage {
    async fn insert_group(&self, group: &MembershipGroup) -> StorageResult<()> {
        let mut table = self.groups.write().await;
        if table.by_id.contains_key(&group.id) {
            return Err(StorageError::Duplicate(format!("group {}", group.id)));
        }
        table.order.push(group.id);
        table.by_id.insert(group.id, group.clone());
        Ok(())
    }

    async fn get_group(&self, group_id: Uuid) -> StorageResult<Option<MembershipGroup>> {
        Ok(self.groups.read().await.by_id.get(&group_id).cloned())
    }

    async fn list_groups(&self, filter: &GroupFilter) -> StorageResult<Vec<MembershipGroup>> {
        let table = self.groups.read().await;
        Ok(table
            .order
            .iter()
            .filter_map(|id| table.by_id.get(id))
            .filter(|group| filter.matches(group))
            .cloned()
            .collect())
    }

    async fn try_add_member(&self, group_id: Uuid, member: Member) -> StorageResult<JoinOutcome> {
        let mut table = self.groups.write().await;
        let Some(group) = table.by_id.get_mut(&group_id) else {
            return Ok(JoinOutcome::Missing);
        };
        if group.is_member(&member.user_id) {
            return Ok(JoinOutcome::AlreadyMember);
        }
        if !group.status.accepts_members() {
            return Ok(JoinOutcome::Closed(group.status));
        }
        if group.is_full() {
            return Ok(JoinOutcome::Full {
                max_members: group.max_members,
            });
        }
        group.members.push(member);
        Ok(JoinOutcome::Joined(group.clone()))
    }

    async fn remove_member(&self, group_id: Uuid, user_id: &str) -> StorageResult<LeaveOutcome> {
        let mut table = self.groups.write().await;
        let Some(group) = table.by_id.get_mut(&group_id) else {
            return Ok(LeaveOutcome::Missing);
        };
        match group.members.iter().position(|m| m.user_id == user_id) {
            Some(idx) if group.members[idx].role == MemberRole::Owner => Ok(LeaveOutcome::IsOwner),
            Some(idx) => {
                group.members.remove(idx);
                Ok(LeaveOutcome::Left(group.clone()))
            }
            None => Ok(LeaveOutcome::NotMember),
        }
    }

    async fn compare_and_set_status(
        &self,
        group_id: Uuid,
        expected: GroupStatus,
        status: GroupStatus,
    ) -> StorageResult<StatusOutcome> {
        let mut table = self.groups.write().await;
        let Some(group) = table.by_id.get_mut(&group_id) else {
            return Ok(StatusOutcome::Missing);
        };
        if group.status != expected {
            return Ok(StatusOutcome::Conflict);
        }
        group.status = status;
        Ok(StatusOutcome::Updated(group.clone()))
    }
}

#[async_trait]
impl RoomStore for MemoryStorage {
    async fn get_or_create_room(&self, room: Room) -> StorageResult<Room> {
        let mut rooms = self.rooms.write().await;
        Ok(rooms.entry(room.id.clone()).or_insert(room).clone())
    }

    async fn get_room(&self, room_id: &RoomId) -> StorageResult<Option<Room>> {
        Ok(self.rooms.read().await.get(room_id).cloned())
    }
}

#[async_trait]
impl MessageStore for MemoryStorage {
    async fn append_message(&self, message: NewMessage) -> StorageResult<Message> {
        let mut messages = self.messages.write().await;
        let log = messages.entry(message.room_id.clone()).or_default();
        let seq = log.last().map_or(1, |last| last.seq + 1);
        let message = message.into_message(seq);
        log.push(message.clone());
        Ok(message)
    }

    async fn room_history(&self, room_id: &RoomId) -> StorageResult<Vec<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .get(room_id)
            .cloned()
            .unwrap_or_default())
    }
}
