//! Proximity search over active ride-shares.

use crate::backend::error::BackendResult;
use crate::backend::ledger::MembershipLedger;
use crate::shared::{CoreError, GeoPoint, GroupFilter, GroupKind, GroupStatus, RideMatch};

impl MembershipLedger {
    /// Active rides whose origin lies within `radius_meters` of `point`,
    /// earliest departure first. Rides departing at the same instant keep
    /// their creation order.
    pub async fn nearby_active(&self, point: GeoPoint, radius_meters: f64) -> BackendResult<Vec<RideMatch>> {
        point.validate()?;
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(CoreError::validation("radius", "radius must be a positive number of meters").into());
        }

        let filter = GroupFilter {
            kind: Some(GroupKind::Ride),
            status: Some(GroupStatus::Active),
            ..Default::default()
        };

        let mut matches: Vec<RideMatch> = self
            .store
            .list_groups(&filter)
            .await?
            .into_iter()
            .filter_map(|group| {
                let distance_meters = point.distance_meters(&group.ride.as_ref()?.origin);
                (distance_meters <= radius_meters).then_some(RideMatch { group, distance_meters })
            })
            .collect();

        // stable, so creation order breaks ties
        matches.sort_by_key(|m| m.group.ride.as_ref().map(|r| r.departure_time));

        tracing::debug!(
            "[Ledger] {} active rides within {}m of ({}, {})",
            matches.len(),
            radius_meters,
            point.lat,
            point.lng
        );
        Ok(matches)
    }
}
