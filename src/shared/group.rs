//! Membership Group Data Structures
//!
//! A `MembershipGroup` is the one record shape shared by project teams,
//! ride-shares and chat groups: one owner, an ordered member list and a
//! capacity ceiling. The kind decides which statuses are legal and how the
//! owner may move between them.
//!
//! # Invariants
//!
//! - `members.len() <= max_members`
//! - no user appears twice in `members`
//! - the owner is always enrolled with `MemberRole::Owner`
//! - rides only ever go from `Active` to `Inactive`

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::CoreError;
use crate::shared::geo::GeoPoint;

/// What a group is used for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Project,
    Ride,
    ChatGroup,
}

impl GroupKind {
    /// Status a freshly created group starts in
    pub fn initial_status(self) -> GroupStatus {
        match self {
            GroupKind::Project => GroupStatus::Open,
            GroupKind::Ride | GroupKind::ChatGroup => GroupStatus::Active,
        }
    }

    /// Whether `status` belongs to this kind at all
    pub fn supports(self, status: GroupStatus) -> bool {
        use GroupStatus::*;
        match self {
            GroupKind::Project => matches!(status, Open | InProgress | Completed),
            GroupKind::Ride => matches!(status, Active | Inactive),
            GroupKind::ChatGroup => matches!(status, Active | Archived),
        }
    }

    /// Legal owner-initiated transitions. Re-applying the current status is allowed.
    pub fn can_transition(self, from: GroupStatus, to: GroupStatus) -> bool {
        use GroupStatus::*;
        if !self.supports(from) || !self.supports(to) {
            return false;
        }
        if from == to {
            return true;
        }
        match self {
            GroupKind::Project => matches!(
                (from, to),
                (Open, InProgress) | (InProgress, Open) | (Open, Completed) | (InProgress, Completed)
            ),
            GroupKind::Ride => matches!((from, to), (Active, Inactive)),
            GroupKind::ChatGroup => matches!((from, to), (Active, Archived)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Project => "project",
            GroupKind::Ride => "ride",
            GroupKind::ChatGroup => "chat_group",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(GroupKind::Project),
            "ride" => Ok(GroupKind::Ride),
            "chat_group" => Ok(GroupKind::ChatGroup),
            other => Err(CoreError::validation("kind", format!("unknown group kind '{other}'"))),
        }
    }
}

/// Kind-specific lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Project accepting members
    Open,
    /// Project under way, still accepting members
    InProgress,
    /// Project finished
    Completed,
    /// Ride or chat group in use
    Active,
    /// Ride deactivated (`isActive = false`)
    Inactive,
    /// Chat group closed
    Archived,
}

impl GroupStatus {
    /// Every status in which the group still accepts new members
    pub const JOINABLE: [GroupStatus; 3] = [GroupStatus::Open, GroupStatus::InProgress, GroupStatus::Active];

    pub fn accepts_members(self) -> bool {
        Self::JOINABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupStatus::Open => "open",
            GroupStatus::InProgress => "in_progress",
            GroupStatus::Completed => "completed",
            GroupStatus::Active => "active",
            GroupStatus::Inactive => "inactive",
            GroupStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(GroupStatus::Open),
            "in_progress" => Ok(GroupStatus::InProgress),
            "completed" => Ok(GroupStatus::Completed),
            "active" => Ok(GroupStatus::Active),
            "inactive" => Ok(GroupStatus::Inactive),
            "archived" => Ok(GroupStatus::Archived),
            other => Err(CoreError::validation("status", format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "owner" => MemberRole::Owner,
            _ => MemberRole::Member,
        }
    }
}

/// One enrolled user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
    pub role: MemberRole,
}

impl Member {
    pub fn owner(user_id: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            joined_at,
            role: MemberRole::Owner,
        }
    }

    pub fn member(user_id: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            joined_at,
            role: MemberRole::Member,
        }
    }
}

/// Ride-share specifics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RideDetails {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub departure_time: DateTime<Utc>,
}

/// Caller-supplied attributes for `create`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupAttrs {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ride: Option<RideDetails>,
}

/// A project team, ride-share or chat group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipGroup {
    pub id: Uuid,
    pub kind: GroupKind,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub members: Vec<Member>,
    pub max_members: u32,
    pub status: GroupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride: Option<RideDetails>,
    pub created_at: DateTime<Utc>,
}

impl MembershipGroup {
    /// Assemble a new group with the owner enrolled as its first member.
    /// Validation is the ledger's job; this only builds the record.
    pub fn new(owner_id: impl Into<String>, kind: GroupKind, max_members: u32, attrs: GroupAttrs) -> Self {
        let owner_id = owner_id.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            members: vec![Member::owner(owner_id.clone(), now)],
            owner_id,
            title: attrs.title,
            description: attrs.description,
            max_members,
            status: kind.initial_status(),
            ride: attrs.ride,
            created_at: now,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members as usize
    }

    pub fn free_slots(&self) -> u32 {
        self.max_members.saturating_sub(self.members.len() as u32)
    }

    pub fn member_ids(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.user_id.as_str()).collect()
    }

    /// Active ride-share, the only kind `nearby_active` considers
    pub fn is_active_ride(&self) -> bool {
        self.kind == GroupKind::Ride && self.status == GroupStatus::Active
    }
}

/// Listing filter; every `None` field matches everything
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupFilter {
    #[serde(default)]
    pub kind: Option<GroupKind>,
    #[serde(default)]
    pub status: Option<GroupStatus>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub member: Option<String>,
}

impl GroupFilter {
    pub fn matches(&self, group: &MembershipGroup) -> bool {
        self.kind.map_or(true, |k| group.kind == k)
            && self.status.map_or(true, |s| group.status == s)
            && self.owner.as_deref().map_or(true, |o| group.owner_id == o)
            && self.member.as_deref().map_or(true, |u| group.is_member(u))
    }
}

/// An active ride returned by a proximity search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RideMatch {
    pub group: MembershipGroup,
    pub distance_meters: f64,
}
