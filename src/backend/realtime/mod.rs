//! Real-time Module
//!
//! Live room-scoped messaging over WebSocket.
//!
//! # Architecture
//!
//! - **`broker`** - `Broker` trait and the in-process `LocalBroker`:
//!   connections, room subscriptions, fan-out
//! - **`session`** - `ChatSession`: the per-connection state machine that
//!   handles `join-room`, `leave-room` and `send-message`
//! - **`socket`** - the `/ws` upgrade handler pumping frames between the
//!   socket and a session
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs     - Module exports and message publishing
//! ├── broker.rs  - Subscriber sets and bounded outboxes
//! ├── session.rs - Client event handling
//! └── socket.rs  - WebSocket transport
//! ```
//!
//! Messages are persisted before they are published. Live delivery is
//! best-effort; a client that missed something reads history.

/// Connection and subscription registry
pub mod broker;

/// Per-connection chat session
pub mod session;

/// WebSocket transport
pub mod socket;

pub use broker::{Broker, BrokerError, Connection, ConnectionId, LocalBroker};
pub use session::{ChatSession, SessionContext, SessionState};
pub use socket::handle_chat_socket;

use crate::shared::{Message, MessagePayload, SenderInfo, ServerEvent};

/// Publish a stored message to its room as `receive-message`. The sender
/// card's id is pinned to the stored sender.
pub async fn publish_message(
    broker: &dyn Broker,
    message: &Message,
    sender: SenderInfo,
    origin: Option<ConnectionId>,
) -> usize {
    let event = ServerEvent::ReceiveMessage(MessagePayload::from_message(message, sender));
    broker.publish(&message.room_id, event, origin).await
}
