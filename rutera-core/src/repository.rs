use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Booking, FinalizeBooking, PlaceHold, SeatHold};
use crate::CoreResult;
use rutera_catalog::{Seat, Stop, Trip};

/// Read-only access to the route/stop catalog and published seat layouts.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_trip(&self, trip_id: Uuid) -> CoreResult<Option<Trip>>;

    /// Stops of a route in boarding order.
    async fn get_stops(&self, route_id: Uuid) -> CoreResult<Vec<Stop>>;

    async fn get_seats(&self, bus_id: Uuid) -> CoreResult<Vec<Seat>>;

    async fn get_seat(&self, seat_id: Uuid) -> CoreResult<Option<Seat>>;
}

/// Read side of the (trip, seat) occupancy timeline.
///
/// Holds are returned as stored, expired rows included; expiry is applied at
/// read time by the occupancy index, never here.
#[async_trait]
pub trait OccupancyRepository: Send + Sync {
    async fn get_bookings_for_seat(&self, trip_id: Uuid, seat_id: Uuid)
        -> CoreResult<Vec<Booking>>;

    async fn get_holds_for_seat(&self, trip_id: Uuid, seat_id: Uuid) -> CoreResult<Vec<SeatHold>>;
}

/// Write side of the hold lifecycle.
///
/// `place_hold` must be atomic with respect to its occupancy precondition:
/// two concurrent placements for overlapping segments on the same seat must
/// not both succeed. A read-then-write pair is not an implementation of this
/// trait.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    async fn place_hold(&self, cmd: &PlaceHold, now: DateTime<Utc>) -> CoreResult<SeatHold>;

    /// Idempotent: releasing an absent hold is Ok, not an error.
    async fn release_hold(&self, trip_id: Uuid, seat_id: Uuid, session_id: &str)
        -> CoreResult<()>;

    /// Renew a live hold owned by the session. An absent or already-expired
    /// hold is NotFound.
    async fn extend_hold(
        &self,
        hold_id: Uuid,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<SeatHold>;

    /// Storage hygiene only; correctness relies on read-time expiry.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> CoreResult<u64>;
}

/// Booking finalization boundary.
///
/// Converts a live hold into a pending booking in one transaction: occupancy
/// is re-checked at commit time and the hold is consumed by the same write.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn finalize_booking(
        &self,
        cmd: &FinalizeBooking,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking>;
}
