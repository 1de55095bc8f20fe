//! Storage Module
//!
//! Persistence seams for the three durable concerns: membership groups,
//! rooms and messages. Services only ever see the traits; the backend is
//! chosen at startup.
//!
//! # Backends
//!
//! - **`memory`** - tokio `RwLock` tables, used when no database is configured
//!   and throughout the unit tests
//! - **`sqlite`** - sqlx SQLite pool with migrations
//!
//! # Atomicity
//!
//! Two operations must be atomic at this layer, not in the services above it:
//!
//! - `GroupStore::try_add_member` checks membership, status and capacity and
//!   appends in one step. The in-memory backend holds the table write lock for
//!   the whole check-and-append; SQLite runs a single conditional
//!   `INSERT ... SELECT ... WHERE count < max_members` statement.
//! - `MessageStore::append_message` assigns the next per-room `seq` and
//!   inserts in one step.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::group::{GroupFilter, GroupStatus, Member, MembershipGroup};
use crate::shared::message::{Message, NewMessage};
use crate::shared::room::{Room, RoomId};

/// In-memory backend
pub mod memory;

/// SQLite backend
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Storage failures. Domain rule violations are reported through the
/// outcome enums, never through this type.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into a domain value
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of the atomic conditional join
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(MembershipGroup),
    AlreadyMember,
    Full { max_members: u32 },
    Closed(GroupStatus),
    Missing,
}

/// Result of removing a member
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    Left(MembershipGroup),
    IsOwner,
    NotMember,
    Missing,
}

/// Result of a compare-and-set status write
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    Updated(MembershipGroup),
    /// The stored status was no longer the expected one
    Conflict,
    Missing,
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Persist a freshly created group including its owner row
    async fn insert_group(&self, group: &MembershipGroup) -> StorageResult<()>;

    async fn get_group(&self, group_id: Uuid) -> StorageResult<Option<MembershipGroup>>;

    /// Groups matching `filter`, in creation order
    async fn list_groups(&self, filter: &GroupFilter) -> StorageResult<Vec<MembershipGroup>>;

    /// Append `member` iff the group exists, accepts members, does not already
    /// contain the user and has fewer than `max_members` members
    async fn try_add_member(&self, group_id: Uuid, member: Member) -> StorageResult<JoinOutcome>;

    /// Remove a non-owner member
    async fn remove_member(&self, group_id: Uuid, user_id: &str) -> StorageResult<LeaveOutcome>;

    /// Set `status` iff the stored status still equals `expected`
    async fn compare_and_set_status(
        &self,
        group_id: Uuid,
        expected: GroupStatus,
        status: GroupStatus,
    ) -> StorageResult<StatusOutcome>;
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert `room` unless a room with the same id exists; return the stored room
    async fn get_or_create_room(&self, room: Room) -> StorageResult<Room>;

    async fn get_room(&self, room_id: &RoomId) -> StorageResult<Option<Room>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Assign the next `seq` for the room and persist
    async fn append_message(&self, message: NewMessage) -> StorageResult<Message>;

    /// All messages of the room ordered by `seq`
    async fn room_history(&self, room_id: &RoomId) -> StorageResult<Vec<Message>>;
}

/// The three stores, usually backed by one backend
#[derive(Clone)]
pub struct Stores {
    pub groups: Arc<dyn GroupStore>,
    pub rooms: Arc<dyn RoomStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    pub fn memory() -> Self {
        let storage = Arc::new(MemoryStorage::new());
        Self {
            groups: storage.clone(),
            rooms: storage.clone(),
            messages: storage,
        }
    }

    pub fn sqlite(storage: SqliteStorage) -> Self {
        let storage = Arc::new(storage);
        Self {
            groups: storage.clone(),
            rooms: storage.clone(),
            messages: storage,
        }
    }
}
