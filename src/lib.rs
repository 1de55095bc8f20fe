//! StudyHub - Core Library
//!
//! StudyHub is the collaboration core of a student platform: project teams,
//! ride-shares and chat groups share one capacity-bounded membership ledger,
//! and a room-scoped real-time messaging layer runs on top of it.
//!
//! # Module Structure
//!
//! - **`shared`** - Domain types shared by services and wire protocols
//!   - Membership groups, rooms, messages, real-time frames
//!   - Domain error taxonomy and configuration
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Storage backends (in-memory and SQLite)
//!   - Membership ledger, room registry, message log
//!   - Presence broker and WebSocket sessions
//!   - Axum HTTP routes and identity extraction
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Server components: axum, JWT verification,
//!   tracing subscriber.
//!
//! # Usage
//!
//! ```rust,no_run
//! use studyhub::backend::server::init::create_app;
//! use studyhub::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let app = create_app(config).await?;
//! // Use app with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! All server state is `Send + Sync`: storage backends sit behind
//! `Arc<dyn ...>` trait objects and the broker guards its subscriber sets
//! with a single mutex.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
