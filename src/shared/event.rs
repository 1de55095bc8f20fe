/**
 * Real-time Event System
 *
 * This module defines the frames exchanged over a live chat connection.
 * Every frame is a JSON object `{"event": "<name>", "data": {...}}` with
 * kebab-case event names and camelCase fields.
 *
 * Client to server: `join-room`, `leave-room`, `send-message`.
 * Server to client: `receive-message`, `room-joined`, `room-left`, `error`.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::CoreError;
use crate::shared::message::{Message, SenderInfo};
use crate::shared::room::RoomId;

/// Body of a `send-message` frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: RoomId,
    pub content: String,
    #[serde(default)]
    pub sender: SenderInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_time: Option<String>,
}

/// Body of a `receive-message` frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: Uuid,
    pub room_id: RoomId,
    pub seq: i64,
    pub content: String,
    pub sender: SenderInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MessagePayload {
    /// Pair a stored message with its sender card. The card's id is pinned to
    /// the stored sender.
    pub fn from_message(message: &Message, mut sender: SenderInfo) -> Self {
        sender.id = message.sender_id.clone();
        Self {
            id: message.id,
            room_id: message.room_id.clone(),
            seq: message.seq,
            content: message.content.clone(),
            sender,
            receiver: message.receiver_id.clone(),
            client_time: message.client_time.clone(),
            created_at: message.created_at,
        }
    }
}

/// Frames sent by clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom { room_id: RoomId },
    LeaveRoom { room_id: RoomId },
    SendMessage(SendMessagePayload),
}

/// Frames sent by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    ReceiveMessage(MessagePayload),
    RoomJoined { room_id: RoomId },
    RoomLeft { room_id: RoomId },
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
    },
}

impl ServerEvent {
    pub fn error(code: impl Into<String>, message: impl Into<String>, room_id: Option<RoomId>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
            room_id,
        }
    }

    pub fn from_core_error(err: &CoreError, room_id: Option<RoomId>) -> Self {
        Self::error(err.code(), err.to_string(), room_id)
    }

    /// Wire name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReceiveMessage(_) => "receive-message",
            Self::RoomJoined { .. } => "room-joined",
            Self::RoomLeft { .. } => "room-left",
            Self::Error { .. } => "error",
        }
    }
}
