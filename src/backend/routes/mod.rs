//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation, health check, fallback
//! ├── chat_routes.rs  - Real-time routes (`/ws`)
//! └── api_routes.rs   - JSON API (`/api/...`)
//! ```
//!
//! # API Routes
//!
//! | Method | Path | Identity |
//! |---|---|---|
//! | POST | `/api/groups` | required |
//! | GET | `/api/groups` | anonymous ok |
//! | GET | `/api/groups/{id}` | anonymous ok |
//! | POST | `/api/groups/{id}/join` | required |
//! | POST | `/api/groups/{id}/leave` | required |
//! | PUT | `/api/groups/{id}/status` | required |
//! | GET | `/api/rides/nearby` | anonymous ok |
//! | POST | `/api/rooms/resolve` | required |
//! | GET | `/api/rooms/{room_id}/messages` | required |
//! | POST | `/api/rooms/{room_id}/messages` | required |
//!
//! # Chat Routes
//!
//! - `GET /ws` - WebSocket upgrade (identity required)
//!
//! # Example
//!
//! ```rust,no_run
//! use studyhub::backend::routes::create_router;
//! use studyhub::backend::server::state::AppState;
//! use studyhub::backend::storage::Stores;
//! use studyhub::shared::AppConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::builder().dev_auth_bypass(true).build()?;
//! let router = create_router(AppState::new(config, Stores::memory()));
//! # Ok(())
//! # }
//! ```

/// Main router creation
pub mod router;

/// Real-time routes
pub mod chat_routes;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
