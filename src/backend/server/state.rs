/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` holds the three services and the broker:
 * - `MembershipLedger` - groups, membership, ride search
 * - `RoomRegistry` - room resolution
 * - `MessageLog` - per-room history
 * - `Arc<dyn Broker>` - live connections and fan-out
 *
 * Every service is a cheap handle over `Arc`ed storage, so cloning the
 * state per request costs a few reference count bumps.
 *
 * # Example
 *
 * ```rust
 * use studyhub::backend::server::state::AppState;
 * use studyhub::backend::ledger::MembershipLedger;
 * use axum::extract::State;
 *
 * async fn handler(State(ledger): State<MembershipLedger>) {
 *     // ledger.join(...)
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::ledger::MembershipLedger;
use crate::backend::messages::MessageLog;
use crate::backend::realtime::broker::{Broker, LocalBroker};
use crate::backend::realtime::session::SessionContext;
use crate::backend::rooms::RoomRegistry;
use crate::backend::storage::Stores;
use crate::shared::AppConfig;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub ledger: MembershipLedger,
    pub rooms: RoomRegistry,
    pub messages: MessageLog,
    pub broker: Arc<dyn Broker>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire the services over `stores` with an in-process broker
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        let broker: Arc<dyn Broker> = Arc::new(LocalBroker::new(config.connection_queue_capacity));
        Self::with_broker(config, stores, broker)
    }

    pub fn with_broker(config: AppConfig, stores: Stores, broker: Arc<dyn Broker>) -> Self {
        Self {
            ledger: MembershipLedger::new(stores.groups.clone()),
            rooms: RoomRegistry::new(stores.rooms.clone(), stores.groups),
            messages: MessageLog::new(stores.rooms, stores.messages, config.max_message_chars),
            broker,
            config: Arc::new(config),
        }
    }

    /// What a chat session needs from the state
    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            broker: self.broker.clone(),
            rooms: self.rooms.clone(),
            messages: self.messages.clone(),
        }
    }
}

impl FromRef<AppState> for MembershipLedger {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ledger.clone()
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rooms.clone()
    }
}

impl FromRef<AppState> for MessageLog {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.messages.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Broker> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.broker.clone()
    }
}
