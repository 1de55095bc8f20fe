/**
 * Chat Session
 *
 * One `ChatSession` drives one live connection: it registers with the
 * broker, turns client frames into room and message operations and reports
 * failures back as `error` frames. It knows nothing about the transport, so
 * the WebSocket handler and the tests drive it the same way.
 *
 * # States
 *
 * ```text
 * Disconnected -> Connecting -> Connected -> RoomJoined <-> Connected -> Disconnected
 * ```
 *
 * A reconnect is a new session; no rooms are remembered.
 */

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::error::BackendError;
use crate::backend::messages::MessageLog;
use crate::backend::realtime::broker::{Broker, BrokerError, ConnectionId};
use crate::backend::realtime::publish_message;
use crate::backend::rooms::RoomRegistry;
use crate::shared::{ClientEvent, NewMessage, RoomId, SendMessagePayload, ServerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    /// Identified, no rooms joined
    Connected,
    /// At least one room joined
    RoomJoined,
}

/// Services a session talks to
#[derive(Clone)]
pub struct SessionContext {
    pub broker: Arc<dyn Broker>,
    pub rooms: RoomRegistry,
    pub messages: MessageLog,
}

pub struct ChatSession {
    ctx: SessionContext,
    connection: ConnectionId,
    user_id: String,
    joined: BTreeSet<RoomId>,
    state: SessionState,
}

impl ChatSession {
    /// Register a connection for `user_id`. Returns the session and the
    /// receiving end of its outbox.
    pub async fn open(
        ctx: SessionContext,
        user_id: &str,
    ) -> Result<(Self, mpsc::Receiver<ServerEvent>), BrokerError> {
        let connection = ctx.broker.connect().await;
        let mut session = Self {
            ctx,
            connection: connection.id,
            user_id: user_id.to_string(),
            joined: BTreeSet::new(),
            state: SessionState::Connecting,
        };

        if let Err(err) = session.ctx.broker.identify(connection.id, user_id).await {
            session.ctx.broker.disconnect(connection.id).await;
            return Err(err);
        }
        session.state = SessionState::Connected;
        tracing::info!("[Session] {} opened {}", user_id, session.connection);
        Ok((session, connection.outbox))
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn joined_rooms(&self) -> impl Iterator<Item = &RoomId> {
        self.joined.iter()
    }

    /// Parse and handle one text frame
    pub async fn handle_text(&mut self, text: &str) -> Vec<ServerEvent> {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle(event).await,
            Err(err) => {
                tracing::debug!("[Session] {} sent an unreadable frame: {}", self.connection, err);
                vec![ServerEvent::error("bad_frame", format!("unreadable frame: {err}"), None)]
            }
        }
    }

    /// Handle one client event; the returned frames go to this connection only
    pub async fn handle(&mut self, event: ClientEvent) -> Vec<ServerEvent> {
        if self.state == SessionState::Disconnected {
            return vec![ServerEvent::error("disconnected", "session is closed", None)];
        }

        let (room_id, result) = match event {
            ClientEvent::JoinRoom { room_id } => {
                let result = self.join(&room_id).await;
                (room_id, result)
            }
            ClientEvent::LeaveRoom { room_id } => {
                let result = self.leave(&room_id).await;
                (room_id, result)
            }
            ClientEvent::SendMessage(payload) => {
                let room_id = payload.room_id.clone();
                let result = self.send(payload).await;
                (room_id, result)
            }
        };

        match result {
            Ok(replies) => replies,
            Err(err) => {
                tracing::warn!("[Session] {} ({}) in {}: {}", self.user_id, self.connection, room_id, err);
                vec![error_event(&err, room_id)]
            }
        }
    }

    /// Leave the broker; further events are refused
    pub async fn close(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        self.ctx.broker.disconnect(self.connection).await;
        self.joined.clear();
        self.state = SessionState::Disconnected;
        tracing::info!("[Session] {} closed {}", self.user_id, self.connection);
    }

    async fn join(&mut self, room_id: &RoomId) -> Result<Vec<ServerEvent>, SessionError> {
        self.ctx.rooms.get(room_id).await?;
        self.ctx.broker.join_room(self.connection, room_id).await?;
        self.joined.insert(room_id.clone());
        self.state = SessionState::RoomJoined;
        Ok(vec![ServerEvent::RoomJoined {
            room_id: room_id.clone(),
        }])
    }

    async fn leave(&mut self, room_id: &RoomId) -> Result<Vec<ServerEvent>, SessionError> {
        self.ctx.broker.leave_room(self.connection, room_id).await?;
        self.joined.remove(room_id);
        if self.joined.is_empty() {
            self.state = SessionState::Connected;
        }
        Ok(vec![ServerEvent::RoomLeft {
            room_id: room_id.clone(),
        }])
    }

    async fn send(&mut self, payload: SendMessagePayload) -> Result<Vec<ServerEvent>, SessionError> {
        if !self.joined.contains(&payload.room_id) {
            return Err(SessionError::NotJoined);
        }

        let mut message = NewMessage::new(payload.room_id, self.user_id.clone(), payload.content);
        if let Some(receiver) = payload.receiver {
            message = message.with_receiver(receiver);
        }
        if let Some(client_time) = payload.client_time {
            message = message.with_client_time(client_time);
        }

        let stored = self.ctx.messages.append(message).await?;
        publish_message(self.ctx.broker.as_ref(), &stored, payload.sender, Some(self.connection)).await;
        Ok(Vec::new())
    }
}

#[derive(Debug, thiserror::Error)]
enum SessionError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("join the room before sending to it")]
    NotJoined,
}

fn error_event(err: &SessionError, room_id: RoomId) -> ServerEvent {
    match err {
        SessionError::Backend(BackendError::Core(core)) => ServerEvent::from_core_error(core, Some(room_id)),
        SessionError::Backend(other) => ServerEvent::error(other.code(), other.message(), Some(room_id)),
        SessionError::Broker(_) => ServerEvent::error("connection", err.to_string(), Some(room_id)),
        SessionError::NotJoined => ServerEvent::error("not_joined", err.to_string(), Some(room_id)),
    }
}
