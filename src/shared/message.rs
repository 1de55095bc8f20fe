/**
 * Message Data Structure
 *
 * This module defines the persisted chat message and the sender card that
 * travels with it over the real-time protocol.
 *
 * Ordering authority is the server-assigned `seq`, strictly increasing per
 * room. `client_time` is whatever the sender's clock displayed and is kept
 * for presentation only.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::room::RoomId;

/// One persisted chat line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned id
    pub id: Uuid,
    pub room_id: RoomId,
    pub sender_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    /// Server order within the room, starting at 1
    pub seq: i64,
    /// Client-displayed time, never used for ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_time: Option<String>,
    /// Server receipt time
    pub created_at: DateTime<Utc>,
}

/// Fields the caller supplies when appending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub sender_id: String,
    pub content: String,
    pub receiver_id: Option<String>,
    pub client_time: Option<String>,
}

impl NewMessage {
    pub fn new(room_id: RoomId, sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            room_id,
            sender_id: sender_id.into(),
            content: content.into(),
            receiver_id: None,
            client_time: None,
        }
    }

    pub fn with_receiver(mut self, receiver_id: impl Into<String>) -> Self {
        self.receiver_id = Some(receiver_id.into());
        self
    }

    pub fn with_client_time(mut self, client_time: impl Into<String>) -> Self {
        self.client_time = Some(client_time.into());
        self
    }

    /// Materialise with a server id, order and receipt time
    pub fn into_message(self, seq: i64) -> Message {
        Message {
            id: Uuid::new_v4(),
            room_id: self.room_id,
            sender_id: self.sender_id,
            content: self.content,
            receiver_id: self.receiver_id,
            seq,
            client_time: self.client_time,
            created_at: Utc::now(),
        }
    }
}

/// Display card for the sender. Profiles live elsewhere; the client supplies
/// name and avatar, the server pins the id to the identified user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SenderInfo {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_ref: Option<String>,
}

impl SenderInfo {
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}
