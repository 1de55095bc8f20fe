//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Storage backend selection
//! └── init.rs         - Server initialization and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration**: `AppConfig` is loaded by the binary and validated here
//! 2. **Storage**: SQLite when configured, otherwise in-memory
//! 3. **State**: services and the broker are wired into `AppState`
//! 4. **Router**: routes plus tracing and CORS layers

/// Application state management
pub mod state;

/// Storage configuration
pub mod config;

/// Server initialization
pub mod init;

pub use init::{build_router, create_app};
pub use state::AppState;
