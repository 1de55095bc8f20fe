//! Message Log
//!
//! Append-only per-room message history. Appends are validated here and
//! sequenced by the `MessageStore`: every message gets the next `seq` of its
//! room, which is the only ordering history uses. Client clocks are carried
//! along for display and never consulted.

/// HTTP handlers
pub mod handlers;

use std::sync::Arc;

use crate::backend::error::BackendResult;
use crate::backend::storage::{MessageStore, RoomStore};
use crate::shared::room::validate_user_id;
use crate::shared::{CoreError, Message, NewMessage, RoomId};

#[derive(Clone)]
pub struct MessageLog {
    rooms: Arc<dyn RoomStore>,
    messages: Arc<dyn MessageStore>,
    max_message_chars: usize,
}

impl MessageLog {
    pub fn new(rooms: Arc<dyn RoomStore>, messages: Arc<dyn MessageStore>, max_message_chars: usize) -> Self {
        Self {
            rooms,
            messages,
            max_message_chars,
        }
    }

    /// Persist a message at the end of its room's history
    pub async fn append(&self, message: NewMessage) -> BackendResult<Message> {
        validate_user_id("sender_id", &message.sender_id)?;
        if message.content.trim().is_empty() {
            return Err(CoreError::validation("content", "message content cannot be blank").into());
        }
        let chars = message.content.chars().count();
        if chars > self.max_message_chars {
            return Err(CoreError::validation(
                "content",
                format!("message is {chars} characters, the limit is {}", self.max_message_chars),
            )
            .into());
        }
        self.require_room(&message.room_id).await?;

        let stored = self.messages.append_message(message).await?;
        tracing::debug!(
            "[Messages] {} appended #{} to {}",
            stored.sender_id,
            stored.seq,
            stored.room_id
        );
        Ok(stored)
    }

    /// Full history of a room, oldest first
    pub async fn history(&self, room_id: &RoomId) -> BackendResult<Vec<Message>> {
        self.require_room(room_id).await?;
        Ok(self.messages.room_history(room_id).await?)
    }

    async fn require_room(&self, room_id: &RoomId) -> BackendResult<()> {
        match self.rooms.get_room(room_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::UnknownRoom {
                room_id: room_id.clone(),
            }
            .into()),
        }
    }
}
