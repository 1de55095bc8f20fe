//! Shared Error Types
//!
//! This module defines the domain error taxonomy shared by the membership
//! ledger, the room registry and the message store. These errors are
//! synchronous, caller-visible failures: the core never retries on its own.
//!
//! # Error Categories
//!
//! - Capacity and membership: `InvalidCapacity`, `GroupFull`, `GroupClosed`,
//!   `AlreadyMember`, `NotMember`, `OwnerCannotLeave`
//! - Ownership and lifecycle: `NotOwner`, `InvalidStatusTransition`
//! - Lookup: `UnknownGroup`, `UnknownRoom`
//! - Ride validation: `InvalidCoordinates`, `InvalidDepartureTime`
//! - Everything else about malformed input: `Validation`
//!
//! # Usage
//!
//! ```rust
//! use studyhub::shared::error::CoreError;
//!
//! let error = CoreError::validation("content", "message content cannot be blank");
//! assert_eq!(error.code(), "validation");
//! ```
use thiserror::Error;
use uuid::Uuid;

use crate::shared::group::GroupStatus;
use crate::shared::room::RoomId;

/// Domain errors raised by the core services
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A group was created with `max_members < 1`
    #[error("invalid capacity {requested}: a group needs room for at least its owner")]
    InvalidCapacity {
        /// The rejected capacity
        requested: i64,
    },

    /// The group has no free slot left
    #[error("group {group_id} is full ({max_members} members)")]
    GroupFull {
        group_id: Uuid,
        max_members: u32,
    },

    /// The group no longer accepts members (completed, inactive or archived)
    #[error("group {group_id} is {status} and no longer accepts members")]
    GroupClosed {
        group_id: Uuid,
        status: GroupStatus,
    },

    /// The user is already enrolled
    #[error("user {user_id} is already a member of group {group_id}")]
    AlreadyMember {
        group_id: Uuid,
        user_id: String,
    },

    /// The user is not enrolled
    #[error("user {user_id} is not a member of group {group_id}")]
    NotMember {
        group_id: Uuid,
        user_id: String,
    },

    /// Only the owner may perform this operation
    #[error("user {user_id} is not the owner of group {group_id}")]
    NotOwner {
        group_id: Uuid,
        user_id: String,
    },

    /// The owner tried to leave their own group
    #[error("the owner of group {group_id} cannot leave it")]
    OwnerCannotLeave {
        group_id: Uuid,
    },

    /// The requested status change is not legal for this kind of group
    #[error("group {group_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        group_id: Uuid,
        from: GroupStatus,
        to: GroupStatus,
    },

    /// No group with this id
    #[error("unknown group {group_id}")]
    UnknownGroup {
        group_id: Uuid,
    },

    /// No room with this id
    #[error("unknown room {room_id}")]
    UnknownRoom {
        room_id: RoomId,
    },

    /// Latitude/longitude out of range or not finite
    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates {
        lat: f64,
        lng: f64,
    },

    /// Departure time is in the past
    #[error("invalid departure time: {message}")]
    InvalidDepartureTime {
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl CoreError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in HTTP bodies and socket error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCapacity { .. } => "invalid_capacity",
            Self::GroupFull { .. } => "group_full",
            Self::GroupClosed { .. } => "group_closed",
            Self::AlreadyMember { .. } => "already_member",
            Self::NotMember { .. } => "not_member",
            Self::NotOwner { .. } => "not_owner",
            Self::OwnerCannotLeave { .. } => "owner_cannot_leave",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::UnknownGroup { .. } => "unknown_group",
            Self::UnknownRoom { .. } => "unknown_room",
            Self::InvalidCoordinates { .. } => "invalid_coordinates",
            Self::InvalidDepartureTime { .. } => "invalid_departure_time",
            Self::Validation { .. } => "validation",
        }
    }
}
