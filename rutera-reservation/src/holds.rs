use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::segment::Segment;
use rutera_core::models::{PlaceHold, SeatHold};
use rutera_core::repository::{CatalogRepository, HoldRepository};
use rutera_core::{CoreError, CoreResult};

/// Default checkout window: ten minutes.
pub const DEFAULT_HOLD_TTL_SECONDS: i64 = 600;

/// Hold lifecycle knobs, sourced from business rules.
#[derive(Debug, Clone)]
pub struct HoldPolicy {
    pub ttl_seconds: i64,
    pub max_seats_per_session: i64,
}

impl Default for HoldPolicy {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_HOLD_TTL_SECONDS,
            max_seats_per_session: 1,
        }
    }
}

/// The only component allowed to create or remove seat holds.
///
/// Lifecycle per (trip, seat, session): `none -> held -> {released, expired,
/// consumed}`. Expiry is passive (read-time), consumption happens inside the
/// booking finalizer's transaction, and everything else goes through here.
pub struct HoldManager {
    catalog: Arc<dyn CatalogRepository>,
    holds: Arc<dyn HoldRepository>,
    policy: HoldPolicy,
}

impl HoldManager {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        holds: Arc<dyn HoldRepository>,
        policy: HoldPolicy,
    ) -> Self {
        Self {
            catalog,
            holds,
            policy,
        }
    }

    pub fn policy(&self) -> &HoldPolicy {
        &self.policy
    }

    /// `none -> held`. The occupancy precondition (candidate segment free,
    /// the session's own holds excluded) is checked atomically with the
    /// insert by the store, so two racing selections cannot both win.
    pub async fn place(
        &self,
        trip_id: Uuid,
        seat_id: Uuid,
        segment: Segment,
        session_id: &str,
    ) -> CoreResult<SeatHold> {
        let trip = self
            .catalog
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("trip {}", trip_id)))?;
        let seat = self
            .catalog
            .get_seat(seat_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("seat {}", seat_id)))?;

        if seat.bus_id != trip.bus_id {
            return Err(CoreError::Validation(format!(
                "seat {} is not on the bus serving trip {}",
                seat_id, trip_id
            )));
        }
        if !seat.is_active {
            return Err(CoreError::Validation(format!(
                "seat {} is deactivated",
                seat_id
            )));
        }

        let now = Utc::now();
        let cmd = PlaceHold {
            trip_id,
            seat_id,
            origin_order: segment.origin_order(),
            destination_order: segment.destination_order(),
            session_id: session_id.to_string(),
            expires_at: now + Duration::seconds(self.policy.ttl_seconds),
            max_seats_per_session: self.policy.max_seats_per_session,
        };

        let hold = self.holds.place_hold(&cmd, now).await?;
        info!(
            "Hold placed: trip {} seat {} [{}, {}) session {} until {}",
            trip_id,
            seat_id,
            hold.origin_order,
            hold.destination_order,
            session_id,
            hold.expires_at
        );
        Ok(hold)
    }

    /// `held -> released`. Idempotent: deselecting a seat that is no longer
    /// held is a no-op, not an error.
    pub async fn release(&self, trip_id: Uuid, seat_id: Uuid, session_id: &str) -> CoreResult<()> {
        self.holds.release_hold(trip_id, seat_id, session_id).await?;
        info!(
            "Hold released: trip {} seat {} session {}",
            trip_id, seat_id, session_id
        );
        Ok(())
    }

    /// Renew a live hold for another checkout window. Extending an absent or
    /// already-expired hold is NotFound.
    pub async fn extend(&self, hold_id: Uuid, session_id: &str) -> CoreResult<SeatHold> {
        let now = Utc::now();
        let hold = self
            .holds
            .extend_hold(
                hold_id,
                session_id,
                now + Duration::seconds(self.policy.ttl_seconds),
                now,
            )
            .await?;
        info!("Hold extended: {} until {}", hold_id, hold.expires_at);
        Ok(hold)
    }

    /// `held -> expired` is passive; this sweep only deletes stale rows for
    /// storage hygiene.
    pub async fn sweep_expired(&self) -> CoreResult<u64> {
        self.holds.sweep_expired(Utc::now()).await
    }
}
