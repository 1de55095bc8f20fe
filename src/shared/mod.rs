//! Shared Module
//!
//! This module contains the domain types used by the services and by the
//! wire protocols: membership groups, rooms, messages, real-time frames,
//! the domain error taxonomy and application configuration.
//!
//! Nothing here depends on the HTTP stack, so these types can be reused by
//! clients and by alternative transports.

/// Domain error taxonomy
pub mod error;

/// Geographic points for ride matching
pub mod geo;

/// Membership groups (projects, rides, chat groups)
pub mod group;

/// Rooms and room ids
pub mod room;

/// Message data structure
pub mod message;

/// Real-time protocol frames
pub mod event;

/// Application configuration
pub mod config;

/// HTTP request and response bodies
pub mod api;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::CoreError;
pub use event::{ClientEvent, MessagePayload, SendMessagePayload, ServerEvent};
pub use geo::GeoPoint;
pub use group::{
    GroupAttrs, GroupFilter, GroupKind, GroupStatus, Member, MemberRole, MembershipGroup, RideDetails,
    RideMatch,
};
pub use message::{Message, NewMessage, SenderInfo};
pub use room::{direct_room_id, Room, RoomId, RoomKey, RoomKind};
