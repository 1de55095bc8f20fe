/**
 * SQLite Storage Backend
 *
 * This module persists groups, rooms and messages with sqlx. The schema
 * lives in `migrations/` and is applied on connect.
 *
 * # Conditional writes
 *
 * Joins and message appends are single statements. SQLite runs each
 * statement in its own implicit transaction and admits one writer at a
 * time, so the capacity check and the insert observe the same snapshot;
 * a writer that loses the race gets `SQLITE_BUSY` (retried by the pool's
 * busy timeout), never a stale read.
 */

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use uuid::Uuid;

use super::{
    GroupStore, JoinOutcome, LeaveOutcome, MessageStore, RoomStore, StatusOutcome, StorageError,
    StorageResult,
};
use crate::shared::geo::GeoPoint;
use crate::shared::group::{
    GroupFilter, GroupKind, GroupStatus, Member, MemberRole, MembershipGroup, RideDetails,
};
use crate::shared::message::{Message, NewMessage};
use crate::shared::room::{Room, RoomId, RoomKey, RoomKind};

const GROUP_COLUMNS: &str = "id, kind, owner_id, title, description, max_members, status, \
     origin_lat, origin_lng, dest_lat, dest_lng, departure_time, created_at";

const MESSAGE_COLUMNS: &str =
    "id, room_id, seq, sender_id, receiver_id, content, client_time, created_at";

/// A join that loses a race against a leave is retried this many times
const JOIN_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database at `url` and run migrations
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // every connection to `:memory:` is a separate database
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// Fresh private in-memory database
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        tracing::info!("[Storage] Running database migrations...");
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("[Storage] Database migrations completed successfully");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_group(&self, group_id: Uuid) -> StorageResult<Option<MembershipGroup>> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = ?");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(group_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let members = self.load_members(&row.id).await?;
                Ok(Some(row.into_group(members)?))
            }
            None => Ok(None),
        }
    }

    async fn load_members(&self, group_id: &str) -> StorageResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT user_id, role, joined_at
            FROM group_members
            WHERE group_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Member {
                user_id: row.user_id,
                joined_at: row.joined_at,
                role: MemberRole::parse(&row.role),
            })
            .collect())
    }

    async fn conditional_insert_member(&self, group_id: Uuid, member: &Member) -> StorageResult<bool> {
        let joinable = GroupStatus::JOINABLE
            .iter()
            .map(|s| format!("'{}'", s.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            INSERT INTO group_members (group_id, user_id, role, joined_at)
            SELECT g.id, ?, ?, ?
            FROM groups g
            WHERE g.id = ?
              AND g.status IN ({joinable})
              AND (SELECT COUNT(*) FROM group_members m WHERE m.group_id = g.id) < g.max_members
              AND NOT EXISTS (
                  SELECT 1 FROM group_members m WHERE m.group_id = g.id AND m.user_id = ?
              )
            "#
        );

        let result = sqlx::query(&sql)
            .bind(&member.user_id)
            .bind(member.role.as_str())
            .bind(member.joined_at)
            .bind(group_id.to_string())
            .bind(&member.user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl GroupStore for SqliteStorage {
    async fn insert_group(&self, group: &MembershipGroup) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        let ride = group.ride.as_ref();
        let inserted = sqlx::query(
            r#"
            INSERT INTO groups (id, kind, owner_id, title, description, max_members, status,
                                origin_lat, origin_lng, dest_lat, dest_lng, departure_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(group.id.to_string())
        .bind(group.kind.as_str())
        .bind(&group.owner_id)
        .bind(&group.title)
        .bind(&group.description)
        .bind(i64::from(group.max_members))
        .bind(group.status.as_str())
        .bind(ride.map(|r| r.origin.lat))
        .bind(ride.map(|r| r.origin.lng))
        .bind(ride.map(|r| r.destination.lat))
        .bind(ride.map(|r| r.destination.lng))
        .bind(ride.map(|r| r.departure_time))
        .bind(group.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted {
            if db_err.is_unique_violation() {
                return Err(StorageError::Duplicate(format!("group {}", group.id)));
            }
        }
        inserted?;

        for member in &group.members {
            sqlx::query(
                r#"
                INSERT INTO group_members (group_id, user_id, role, joined_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(group.id.to_string())
            .bind(&member.user_id)
            .bind(member.role.as_str())
            .bind(member.joined_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_group(&self, group_id: Uuid) -> StorageResult<Option<MembershipGroup>> {
        self.load_group(group_id).await
    }

    async fn list_groups(&self, filter: &GroupFilter) -> StorageResult<Vec<MembershipGroup>> {
        let sql = format!(
            r#"
            SELECT {GROUP_COLUMNS}
            FROM groups g
            WHERE (? IS NULL OR g.kind = ?)
              AND (? IS NULL OR g.status = ?)
              AND (? IS NULL OR g.owner_id = ?)
              AND (? IS NULL OR EXISTS (
                  SELECT 1 FROM group_members m WHERE m.group_id = g.id AND m.user_id = ?
              ))
            ORDER BY g.rowid ASC
            "#
        );

        let kind = filter.kind.map(GroupKind::as_str);
        let status = filter.status.map(GroupStatus::as_str);
        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(kind)
            .bind(kind)
            .bind(status)
            .bind(status)
            .bind(filter.owner.as_deref())
            .bind(filter.owner.as_deref())
            .bind(filter.member.as_deref())
            .bind(filter.member.as_deref())
            .fetch_all(&self.pool)
            .await?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            let members = self.load_members(&row.id).await?;
            groups.push(row.into_group(members)?);
        }
        Ok(groups)
    }

    async fn try_add_member(&self, group_id: Uuid, member: Member) -> StorageResult<JoinOutcome> {
        for attempt in 1..=JOIN_ATTEMPTS {
            if self.conditional_insert_member(group_id, &member).await? {
                return match self.load_group(group_id).await? {
                    Some(group) => Ok(JoinOutcome::Joined(group)),
                    None => Err(StorageError::Corrupt(format!("group {group_id} vanished after join"))),
                };
            }

            // The insert was refused; work out why from a fresh read.
            let Some(group) = self.load_group(group_id).await? else {
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
            tracing::debug!(
                "[Storage] Join of {} into {} refused but a slot is free now, retrying (attempt {})",
                member.user_id,
                group_id,
                attempt
            );
        }

        let max_members = self
            .load_group(group_id)
            .await?
            .map(|g| g.max_members)
            .unwrap_or_default();
        Ok(JoinOutcome::Full { max_members })
    }

    async fn remove_member(&self, group_id: Uuid, user_id: &str) -> StorageResult<LeaveOutcome> {
        let result = sqlx::query(
            r#"
            DELETE FROM group_members
            WHERE group_id = ? AND user_id = ? AND role != 'owner'
            "#,
        )
        .bind(group_id.to_string())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let Some(group) = self.load_group(group_id).await? else {
            return Ok(LeaveOutcome::Missing);
        };
        if result.rows_affected() == 1 {
            return Ok(LeaveOutcome::Left(group));
        }
        if group.owner_id == user_id {
            Ok(LeaveOutcome::IsOwner)
        } else {
            Ok(LeaveOutcome::NotMember)
        }
    }

    async fn compare_and_set_status(
        &self,
        group_id: Uuid,
        expected: GroupStatus,
        status: GroupStatus,
    ) -> StorageResult<StatusOutcome> {
        let result = sqlx::query("UPDATE groups SET status = ? WHERE id = ? AND status = ?")
            .bind(status.as_str())
            .bind(group_id.to_string())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;

        match self.load_group(group_id).await? {
            None => Ok(StatusOutcome::Missing),
            Some(group) if result.rows_affected() == 1 => Ok(StatusOutcome::Updated(group)),
            Some(_) => Ok(StatusOutcome::Conflict),
        }
    }
}

#[async_trait]
impl RoomStore for SqliteStorage {
    async fn get_or_create_room(&self, room: Room) -> StorageResult<Room> {
        let (user_a, user_b, group_id, context_key) = match &room.key {
            RoomKey::Direct { user_a, user_b } => (Some(user_a.as_str()), Some(user_b.as_str()), None, None),
            RoomKey::Group { group_id } => (None, None, Some(group_id.to_string()), None),
            RoomKey::Contextual { context_key } => (None, None, None, Some(context_key.as_str())),
        };

        sqlx::query(
            r#"
            INSERT INTO rooms (id, kind, user_a, user_b, group_id, context_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(room.id.as_str())
        .bind(room.kind.as_str())
        .bind(user_a)
        .bind(user_b)
        .bind(group_id)
        .bind(context_key)
        .bind(room.created_at)
        .execute(&self.pool)
        .await?;

        self.get_room(&room.id)
            .await?
            .ok_or_else(|| StorageError::Corrupt(format!("room {} missing after insert", room.id)))
    }

    async fn get_room(&self, room_id: &RoomId) -> StorageResult<Option<Room>> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, kind, user_a, user_b, group_id, context_key, created_at
            FROM rooms
            WHERE id = ?
            "#,
        )
        .bind(room_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(RoomRow::into_room).transpose()
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn append_message(&self, message: NewMessage) -> StorageResult<Message> {
        // seq is filled in from the database
        let mut message = message.into_message(0);

        let row = sqlx::query(
            r#"
            INSERT INTO messages (id, room_id, seq, sender_id, receiver_id, content, client_time, created_at)
            SELECT ?, ?, COALESCE(MAX(seq), 0) + 1, ?, ?, ?, ?, ?
            FROM messages
            WHERE room_id = ?
            RETURNING seq
            "#,
        )
        .bind(message.id.to_string())
        .bind(message.room_id.as_str())
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(&message.content)
        .bind(&message.client_time)
        .bind(message.created_at)
        .bind(message.room_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        message.seq = row.try_get("seq")?;
        Ok(message)
    }

    async fn room_history(&self, room_id: &RoomId) -> StorageResult<Vec<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE room_id = ? ORDER BY seq ASC");
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(room_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: String,
    kind: String,
    owner_id: String,
    title: String,
    description: Option<String>,
    max_members: i64,
    status: String,
    origin_lat: Option<f64>,
    origin_lng: Option<f64>,
    dest_lat: Option<f64>,
    dest_lng: Option<f64>,
    departure_time: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, members: Vec<Member>) -> StorageResult<MembershipGroup> {
        let id = parse_uuid(&self.id)?;
        let kind = GroupKind::from_str(&self.kind).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let status = GroupStatus::from_str(&self.status).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let max_members = u32::try_from(self.max_members)
            .map_err(|_| StorageError::Corrupt(format!("group {id} has max_members {}", self.max_members)))?;

        let ride = match (
            self.origin_lat,
            self.origin_lng,
            self.dest_lat,
            self.dest_lng,
            self.departure_time,
        ) {
            (Some(olat), Some(olng), Some(dlat), Some(dlng), Some(departure_time)) => Some(RideDetails {
                origin: GeoPoint { lat: olat, lng: olng },
                destination: GeoPoint { lat: dlat, lng: dlng },
                departure_time,
            }),
            _ => None,
        };

        Ok(MembershipGroup {
            id,
            kind,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            members,
            max_members,
            status,
            ride,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: String,
    role: String,
    joined_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: String,
    kind: String,
    user_a: Option<String>,
    user_b: Option<String>,
    group_id: Option<String>,
    context_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self) -> StorageResult<Room> {
        let corrupt = |what: &str| StorageError::Corrupt(format!("room {} {what}", self.id));
        let (kind, key) = match self.kind.as_str() {
            "direct" => match (self.user_a.clone(), self.user_b.clone()) {
                (Some(user_a), Some(user_b)) => (RoomKind::Direct, RoomKey::Direct { user_a, user_b }),
                _ => return Err(corrupt("is missing its participants")),
            },
            "group" => match self.group_id.as_deref() {
                Some(raw) => (RoomKind::Group, RoomKey::Group { group_id: parse_uuid(raw)? }),
                None => return Err(corrupt("is missing its group id")),
            },
            "contextual" => match self.context_key.clone() {
                Some(context_key) => (RoomKind::Contextual, RoomKey::Contextual { context_key }),
                None => return Err(corrupt("is missing its context key")),
            },
            other => return Err(corrupt(&format!("has unknown kind '{other}'"))),
        };

        Ok(Room {
            id: RoomId::from(self.id),
            kind,
            key,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    room_id: String,
    seq: i64,
    sender_id: String,
    receiver_id: Option<String>,
    content: String,
    client_time: Option<String>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> StorageResult<Message> {
        Ok(Message {
            id: parse_uuid(&self.id)?,
            room_id: RoomId::from(self.room_id),
            sender_id: self.sender_id,
            content: self.content,
            receiver_id: self.receiver_id,
            seq: self.seq,
            client_time: self.client_time,
            created_at: self.created_at,
        })
    }
}

fn parse_uuid(raw: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StorageError::Corrupt(format!("bad uuid '{raw}': {e}")))
}
