use uuid::Uuid;

/// What changed on a seat, from the point of view of a seat-map viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatChangeKind {
    Held,
    Released,
    Booked,
}

/// Broadcast on the per-trip notification channel after any hold or booking
/// mutation. Delivery is at-least-once; consumers recompute idempotently.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatMapChangedEvent {
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub kind: SeatChangeKind,
    pub occurred_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct HoldPlacedEvent {
    pub hold_id: Uuid,
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_order: i32,
    pub destination_order: i32,
    pub expires_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct HoldReleasedEvent {
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub released_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingFinalizedEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_order: i32,
    pub destination_order: i32,
    pub finalized_at: i64,
}
