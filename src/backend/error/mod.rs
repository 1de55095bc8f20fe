//! Backend Error Module
//!
//! This module defines the error type used by the services and HTTP handlers.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - BackendError and its status/code mapping
//! └── conversion.rs - IntoResponse and extractor rejection conversion
//! ```
//!
//! # Error Types
//!
//! - `Core` - domain rule violations (`CoreError`)
//! - `Storage` - persistence failures
//! - `Unauthorized` - missing or invalid identity
//! - `HandlerError` - request-level problems with an explicit status
//! - `SerializationError` - JSON serialization errors

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::{BackendError, BackendResult};
