/**
 * Backend Error Types
 *
 * This module defines the error type returned by the services and HTTP
 * handlers. Domain rule violations arrive as `CoreError`, persistence
 * failures as `StorageError`; everything else is a handler error carrying
 * its own status.
 *
 * # Status Code Mapping
 *
 * - `Unknown*` - 404 Not Found
 * - membership and lifecycle conflicts - 409 Conflict
 * - `NotOwner` - 403 Forbidden
 * - malformed input (capacity, coordinates, departure, validation) - 400
 * - storage and serialization - 500
 * - `Unauthorized` - 401
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::storage::StorageError;
use crate::shared::CoreError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use studyhub::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err = BackendError::unauthorized("missing bearer token");
/// assert_eq!(err.code(), "unauthorized");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Domain rule violation
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No usable identity on the request
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// Handler error (e.g., malformed path or body)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// The domain error, if this is one
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(err) => match err {
                CoreError::UnknownGroup { .. } | CoreError::UnknownRoom { .. } => StatusCode::NOT_FOUND,
                CoreError::GroupFull { .. }
                | CoreError::AlreadyMember { .. }
                | CoreError::NotMember { .. }
                | CoreError::OwnerCannotLeave { .. }
                | CoreError::GroupClosed { .. }
                | CoreError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
                CoreError::NotOwner { .. } => StatusCode::FORBIDDEN,
                CoreError::InvalidCapacity { .. }
                | CoreError::InvalidCoordinates { .. }
                | CoreError::InvalidDepartureTime { .. }
                | CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            },
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::HandlerError { status, .. } => *status,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.code(),
            Self::Storage(_) => "storage",
            Self::Unauthorized { .. } => "unauthorized",
            Self::HandlerError { status, .. } => handler_code(*status),
            Self::SerializationError(_) => "serialization",
        }
    }

    /// Get the error message. Storage details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            Self::Core(err) => err.to_string(),
            Self::Storage(_) => "internal storage error".to_string(),
            Self::Unauthorized { message } => message.clone(),
            Self::HandlerError { message, .. } => message.clone(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}

/// Code for a handler error, derived from its status
fn handler_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::UNAUTHORIZED => "unauthorized",
        s if s.is_server_error() => "internal",
        _ => "bad_request",
    }
}
