/**
 * Presence Broker
 *
 * This module tracks live connections and which rooms each one listens to,
 * and fans published events out to them.
 *
 * # Delivery
 *
 * Every connection owns a bounded `mpsc` outbox. `publish` enqueues with
 * `try_send` while holding the subscriber lock and never awaits, so one slow
 * client cannot stall the others. A full or closed outbox drops the event
 * for that connection only. Delivery is at-most-once; history is the
 * durable record.
 *
 * # Echo policy
 *
 * The connection that originated an event does not receive it back. Other
 * connections of the same user do.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::shared::{RoomId, ServerEvent};

/// Identifies one live transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0.simple())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("connection {0} has not identified")]
    Anonymous(ConnectionId),
}

/// A freshly registered connection: its id and the receiving end of its
/// outbox. Dropping the receiver makes later deliveries fail silently.
pub struct Connection {
    pub id: ConnectionId,
    pub outbox: mpsc::Receiver<ServerEvent>,
}

/// Room-scoped publish/subscribe
#[async_trait]
pub trait Broker: Send + Sync {
    /// Register a connection with no identity and no rooms
    async fn connect(&self) -> Connection;

    async fn identify(&self, connection: ConnectionId, user_id: &str) -> Result<(), BrokerError>;

    /// The identity bound to `connection`, if any
    async fn identity(&self, connection: ConnectionId) -> Option<String>;

    /// Subscribe; returns `false` if already subscribed
    async fn join_room(&self, connection: ConnectionId, room_id: &RoomId) -> Result<bool, BrokerError>;

    /// Unsubscribe; returns `false` if not subscribed
    async fn leave_room(&self, connection: ConnectionId, room_id: &RoomId) -> Result<bool, BrokerError>;

    /// Deliver to every subscriber of `room_id` except `origin`; returns the
    /// number of connections the event was queued for
    async fn publish(&self, room_id: &RoomId, event: ServerEvent, origin: Option<ConnectionId>) -> usize;

    /// Queue an event for one connection
    async fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> bool;

    /// Forget the connection and all its subscriptions
    async fn disconnect(&self, connection: ConnectionId) -> bool;

    async fn subscriber_count(&self, room_id: &RoomId) -> usize;

    async fn connection_count(&self) -> usize;
}

struct ConnectionEntry {
    outbox: mpsc::Sender<ServerEvent>,
    user_id: Option<String>,
    rooms: HashSet<RoomId>,
}

#[derive(Default)]
struct BrokerState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

/// In-process broker for a single server
#[derive(Clone)]
pub struct LocalBroker {
    state: Arc<Mutex<BrokerState>>,
    queue_capacity: usize,
}

impl LocalBroker {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState::default())),
            queue_capacity: queue_capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        // the state stays consistent across a panic in another holder
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn enqueue(connection: ConnectionId, entry: &ConnectionEntry, event: ServerEvent) -> bool {
    match entry.outbox.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::warn!("[Broker] Outbox of {} is full, dropping {}", connection, event.name());
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!("[Broker] Outbox of {} is closed", connection);
            false
        }
    }
}

#[async_trait]
impl Broker for LocalBroker {
    async fn connect(&self) -> Connection {
        let (outbox, receiver) = mpsc::channel(self.queue_capacity);
        let id = ConnectionId::new();
        let mut state = self.lock();
        state.connections.insert(
            id,
            ConnectionEntry {
                outbox,
                user_id: None,
                rooms: HashSet::new(),
            },
        );
        tracing::debug!("[Broker] {} connected ({} live)", id, state.connections.len());
        Connection { id, outbox: receiver }
    }

    async fn identify(&self, connection: ConnectionId, user_id: &str) -> Result<(), BrokerError> {
        let mut state = self.lock();
        let entry = state
            .connections
            .get_mut(&connection)
            .ok_or(BrokerError::UnknownConnection(connection))?;
        entry.user_id = Some(user_id.to_string());
        tracing::debug!("[Broker] {} identified as {}", connection, user_id);
        Ok(())
    }

    async fn identity(&self, connection: ConnectionId) -> Option<String> {
        self.lock().connections.get(&connection).and_then(|entry| entry.user_id.clone())
    }

    async fn join_room(&self, connection: ConnectionId, room_id: &RoomId) -> Result<bool, BrokerError> {
        let mut state = self.lock();
        let entry = state
            .connections
            .get_mut(&connection)
            .ok_or(BrokerError::UnknownConnection(connection))?;
        if entry.user_id.is_none() {
            return Err(BrokerError::Anonymous(connection));
        }
        if !entry.rooms.insert(room_id.clone()) {
            return Ok(false);
        }
        state.rooms.entry(room_id.clone()).or_default().insert(connection);
        Ok(true)
    }

    async fn leave_room(&self, connection: ConnectionId, room_id: &RoomId) -> Result<bool, BrokerError> {
        let mut state = self.lock();
        let entry = state
            .connections
            .get_mut(&connection)
            .ok_or(BrokerError::UnknownConnection(connection))?;
        if !entry.rooms.remove(room_id) {
            return Ok(false);
        }
        if let Some(subscribers) = state.rooms.get_mut(room_id) {
            subscribers.remove(&connection);
            if subscribers.is_empty() {
                state.rooms.remove(room_id);
            }
        }
        Ok(true)
    }

    async fn publish(&self, room_id: &RoomId, event: ServerEvent, origin: Option<ConnectionId>) -> usize {
        let state = self.lock();
        let Some(subscribers) = state.rooms.get(room_id) else {
            return 0;
        };

        let delivered = subscribers
            .iter()
            .filter(|id| Some(**id) != origin)
            .filter_map(|id| state.connections.get(id).map(|entry| (*id, entry)))
            .filter(|(id, entry)| enqueue(*id, entry, event.clone()))
            .count();

        tracing::debug!("[Broker] {} to {} reached {} connections", event.name(), room_id, delivered);
        delivered
    }

    async fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        let state = self.lock();
        match state.connections.get(&connection) {
            Some(entry) => enqueue(connection, entry, event),
            None => false,
        }
    }

    async fn disconnect(&self, connection: ConnectionId) -> bool {
        let mut state = self.lock();
        let Some(entry) = state.connections.remove(&connection) else {
            return false;
        };
        for room_id in &entry.rooms {
            if let Some(subscribers) = state.rooms.get_mut(room_id) {
                subscribers.remove(&connection);
                if subscribers.is_empty() {
                    state.rooms.remove(room_id);
                }
            }
        }
        tracing::debug!(
            "[Broker] {} disconnected from {} rooms ({} live)",
            connection,
            entry.rooms.len(),
            state.connections.len()
        );
        true
    }

    async fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.lock().rooms.get(room_id).map_or(0, HashSet::len)
    }

    async fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }
}
