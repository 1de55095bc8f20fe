//! Backend Module
//!
//! This module contains all server-side code for StudyHub. It provides an
//! Axum HTTP server with a WebSocket chat endpoint on top of the membership
//! ledger, the room registry and the message log.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`storage`** - Storage traits plus in-memory and SQLite backends
//! - **`ledger`** - Capacity-bounded membership for projects, rides and chat groups
//! - **`rooms`** - Room key resolution and room records
//! - **`messages`** - Append-only per-room message history
//! - **`realtime`** - Presence broker and per-connection chat sessions
//! - **`middleware`** - Caller identity (JWT, dev header)
//! - **`server`** - Application state, storage selection, app creation
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`error`** - Backend error type and HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── storage/        - GroupStore, RoomStore, MessageStore
//! ├── ledger/         - MembershipLedger and ride search
//! ├── rooms/          - RoomRegistry
//! ├── messages/       - MessageLog
//! ├── realtime/       - Broker, ChatSession, WebSocket glue
//! ├── middleware/     - Identity extraction
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` holds the three services and the broker. Services are cheap
//! to clone: each one wraps `Arc<dyn ...Store>` handles, so every handler
//! sees the same storage. Membership changes are never a read-modify-write
//! of a whole group; the stores expose conditional join/leave primitives
//! and a status compare-and-set.
//!
//! # Error Handling
//!
//! Every fallible operation returns `BackendResult<T>`. `BackendError`
//! renders as a JSON body `{ "error", "code", "status" }` with the HTTP
//! status derived from the domain error.

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Storage traits and backends
#[cfg(feature = "ssr")]
pub mod storage;

/// Membership ledger
#[cfg(feature = "ssr")]
pub mod ledger;

/// Room registry
#[cfg(feature = "ssr")]
pub mod rooms;

/// Message log
#[cfg(feature = "ssr")]
pub mod messages;

/// Real-time presence and chat sessions
#[cfg(feature = "ssr")]
pub mod realtime;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use error::{BackendError, BackendResult};
#[cfg(feature = "ssr")]
pub use ledger::MembershipLedger;
#[cfg(feature = "ssr")]
pub use messages::MessageLog;
#[cfg(feature = "ssr")]
pub use rooms::RoomRegistry;
#[cfg(feature = "ssr")]
pub use server::{create_app, AppState};
