//! Room Data Structures
//!
//! A room is the logical channel messages are appended to and fanned out on.
//! Each room is keyed by exactly one of: a pair of users (direct chat), a
//! membership group (group chat), or an opaque context key (a discussion
//! thread tied to some topic).
//!
//! Room ids carry a kind prefix so the three key spaces can never collide:
//!
//! - `dm:{low}:{high}` for direct rooms, ids sorted lexicographically
//! - `group:{uuid}` for group rooms
//! - `topic:{key}` for contextual rooms
//!
//! The kind itself is always stored as an explicit field; nothing should
//! branch on the prefix.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::CoreError;

const DIRECT_PREFIX: &str = "dm";
const GROUP_PREFIX: &str = "group";
const CONTEXT_PREFIX: &str = "topic";
const SEPARATOR: char = ':';

/// Opaque room identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Direct,
    Group,
    Contextual,
}

impl RoomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomKind::Direct => "direct",
            RoomKind::Group => "group",
            RoomKind::Contextual => "contextual",
        }
    }
}

/// The key a room was resolved from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoomKey {
    /// Participants, stored in sorted order
    Direct { user_a: String, user_b: String },
    Group { group_id: Uuid },
    Contextual { context_key: String },
}

impl RoomKey {
    /// Build a direct key, validating and sorting the pair
    pub fn direct(user_a: &str, user_b: &str) -> Result<Self, CoreError> {
        validate_user_id("user_a", user_a)?;
        validate_user_id("user_b", user_b)?;
        if user_a == user_b {
            return Err(CoreError::validation("user_b", "cannot open a direct room with yourself"));
        }
        let (low, high) = if user_a <= user_b { (user_a, user_b) } else { (user_b, user_a) };
        Ok(RoomKey::Direct {
            user_a: low.to_string(),
            user_b: high.to_string(),
        })
    }

    pub fn group(group_id: Uuid) -> Self {
        RoomKey::Group { group_id }
    }

    pub fn contextual(context_key: &str) -> Result<Self, CoreError> {
        if context_key.trim().is_empty() {
            return Err(CoreError::validation("context_key", "context key cannot be blank"));
        }
        Ok(RoomKey::Contextual {
            context_key: context_key.to_string(),
        })
    }

    pub fn kind(&self) -> RoomKind {
        match self {
            RoomKey::Direct { .. } => RoomKind::Direct,
            RoomKey::Group { .. } => RoomKind::Group,
            RoomKey::Contextual { .. } => RoomKind::Contextual,
        }
    }

    /// The stable id this key resolves to
    pub fn room_id(&self) -> RoomId {
        match self {
            RoomKey::Direct { user_a, user_b } => {
                RoomId(format!("{DIRECT_PREFIX}{SEPARATOR}{user_a}{SEPARATOR}{user_b}"))
            }
            RoomKey::Group { group_id } => RoomId(format!("{GROUP_PREFIX}{SEPARATOR}{group_id}")),
            RoomKey::Contextual { context_key } => {
                RoomId(format!("{CONTEXT_PREFIX}{SEPARATOR}{context_key}"))
            }
        }
    }
}

/// Pure, order-independent direct room id
pub fn direct_room_id(user_a: &str, user_b: &str) -> Result<RoomId, CoreError> {
    RoomKey::direct(user_a, user_b).map(|key| key.room_id())
}

/// User ids are opaque but must be non-blank and free of the id separator
pub fn validate_user_id(field: &str, user_id: &str) -> Result<(), CoreError> {
    if user_id.trim().is_empty() {
        return Err(CoreError::validation(field, "user id cannot be blank"));
    }
    if user_id.contains(SEPARATOR) {
        return Err(CoreError::validation(field, "user id cannot contain ':'"));
    }
    Ok(())
}

/// A resolved room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub key: RoomKey,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn from_key(key: RoomKey) -> Self {
        Self {
            id: key.room_id(),
            kind: key.kind(),
            key,
            created_at: Utc::now(),
        }
    }

    /// Participants of a direct room, `None` for other kinds
    pub fn participants(&self) -> Option<(&str, &str)> {
        match &self.key {
            RoomKey::Direct { user_a, user_b } => Some((user_a, user_b)),
            _ => None,
        }
    }
}
