/**
 * Membership Ledger Service
 *
 * Validation and error classification live here; atomicity lives in the
 * `GroupStore` underneath.
 *
 * # Error precedence
 *
 * - join: `UnknownGroup`, `AlreadyMember`, `GroupClosed`, `GroupFull`
 * - leave: `UnknownGroup`, `OwnerCannotLeave`, `NotMember`
 * - set_status: `UnknownGroup`, `NotOwner`, `InvalidStatusTransition`
 */

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::storage::{GroupStore, JoinOutcome, LeaveOutcome, StatusOutcome};
use crate::shared::room::validate_user_id;
use crate::shared::{CoreError, GroupAttrs, GroupFilter, GroupKind, GroupStatus, Member, MembershipGroup};

/// Compare-and-set attempts before a status change gives up
const STATUS_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct MembershipLedger {
    pub(super) store: Arc<dyn GroupStore>,
}

impl MembershipLedger {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    /// Create a group with `owner_id` enrolled as its owner
    pub async fn create(
        &self,
        owner_id: &str,
        kind: GroupKind,
        max_members: i64,
        attrs: GroupAttrs,
    ) -> BackendResult<MembershipGroup> {
        validate_user_id("owner_id", owner_id)?;
        let max_members = u32::try_from(max_members)
            .ok()
            .filter(|max| *max >= 1)
            .ok_or(CoreError::InvalidCapacity { requested: max_members })?;
        validate_attrs(kind, &attrs)?;

        let group = MembershipGroup::new(owner_id, kind, max_members, attrs);
        self.store.insert_group(&group).await?;

        tracing::info!(
            "[Ledger] {} created {} {} ({} slots)",
            owner_id,
            kind,
            group.id,
            max_members
        );
        Ok(group)
    }

    pub async fn get(&self, group_id: Uuid) -> BackendResult<MembershipGroup> {
        self.store
            .get_group(group_id)
            .await?
            .ok_or_else(|| CoreError::UnknownGroup { group_id }.into())
    }

    pub async fn list(&self, filter: &GroupFilter) -> BackendResult<Vec<MembershipGroup>> {
        Ok(self.store.list_groups(filter).await?)
    }

    /// Enrol `user_id` as a regular member
    pub async fn join(&self, group_id: Uuid, user_id: &str) -> BackendResult<MembershipGroup> {
        validate_user_id("user_id", user_id)?;

        let outcome = self
            .store
            .try_add_member(group_id, Member::member(user_id, Utc::now()))
            .await?;

        let error = match outcome {
            JoinOutcome::Joined(group) => {
                tracing::info!(
                    "[Ledger] {} joined {} ({}/{})",
                    user_id,
                    group_id,
                    group.members.len(),
                    group.max_members
                );
                return Ok(group);
            }
            JoinOutcome::Missing => CoreError::UnknownGroup { group_id },
            JoinOutcome::AlreadyMember => CoreError::AlreadyMember {
                group_id,
                user_id: user_id.to_string(),
            },
            JoinOutcome::Closed(status) => CoreError::GroupClosed { group_id, status },
            JoinOutcome::Full { max_members } => CoreError::GroupFull { group_id, max_members },
        };

        tracing::debug!("[Ledger] Join of {} into {} refused: {}", user_id, group_id, error);
        Err(error.into())
    }

    /// Remove `user_id`; the owner can never leave
    pub async fn leave(&self, group_id: Uuid, user_id: &str) -> BackendResult<MembershipGroup> {
        match self.store.remove_member(group_id, user_id).await? {
            LeaveOutcome::Left(group) => {
                tracing::info!("[Ledger] {} left {}", user_id, group_id);
                Ok(group)
            }
            LeaveOutcome::IsOwner => Err(CoreError::OwnerCannotLeave { group_id }.into()),
            LeaveOutcome::NotMember => Err(CoreError::NotMember {
                group_id,
                user_id: user_id.to_string(),
            }
            .into()),
            LeaveOutcome::Missing => Err(CoreError::UnknownGroup { group_id }.into()),
        }
    }

    /// Owner-only lifecycle change
    pub async fn set_status(
        &self,
        group_id: Uuid,
        caller_id: &str,
        status: GroupStatus,
    ) -> BackendResult<MembershipGroup> {
        for _ in 0..STATUS_ATTEMPTS {
            let group = self.get(group_id).await?;
            if group.owner_id != caller_id {
                return Err(CoreError::NotOwner {
                    group_id,
                    user_id: caller_id.to_string(),
                }
                .into());
            }
            if !group.kind.can_transition(group.status, status) {
                return Err(CoreError::InvalidStatusTransition {
                    group_id,
                    from: group.status,
                    to: status,
                }
                .into());
            }
            if group.status == status {
                return Ok(group);
            }

            match self.store.compare_and_set_status(group_id, group.status, status).await? {
                StatusOutcome::Updated(updated) => {
                    tracing::info!("[Ledger] {} moved {} from {} to {}", caller_id, group_id, group.status, status);
                    return Ok(updated);
                }
                StatusOutcome::Missing => return Err(CoreError::UnknownGroup { group_id }.into()),
                StatusOutcome::Conflict => {
                    tracing::debug!("[Ledger] Status of {} changed underneath us, re-reading", group_id);
                }
            }
        }

        Err(BackendError::handler(
            StatusCode::CONFLICT,
            format!("status of group {group_id} is changing concurrently, try again"),
        ))
    }
}

fn validate_attrs(kind: GroupKind, attrs: &GroupAttrs) -> Result<(), CoreError> {
    if attrs.title.trim().is_empty() {
        return Err(CoreError::validation("title", "title cannot be blank"));
    }

    match (kind, &attrs.ride) {
        (GroupKind::Ride, None) => Err(CoreError::validation("ride", "a ride needs origin, destination and departure time")),
        (GroupKind::Ride, Some(ride)) => {
            ride.origin.validate()?;
            ride.destination.validate()?;
            if ride.departure_time < Utc::now() {
                return Err(CoreError::InvalidDepartureTime {
                    message: format!("{} is in the past", ride.departure_time.to_rfc3339()),
                });
            }
            Ok(())
        }
        (_, Some(_)) => Err(CoreError::validation("ride", format!("a {kind} cannot carry ride details"))),
        (_, None) => Ok(()),
    }
}
