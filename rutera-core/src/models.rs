use chrono::{DateTime, Utc};
use rutera_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status lifecycle. Transitions are append-only; a booking row is
/// never physically deleted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Whether a booking in this status occupies its segment. Cancelled
    /// bookings free the segment permanently; completed trips are history.
    pub fn occupies(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

/// A persisted seat booking over a stop-order segment of a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_order: i32,
    pub destination_order: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A time-boxed claim on a seat segment while a session checks out.
///
/// Holds are advisory: the booking finalizer re-checks occupancy at commit
/// time rather than trusting the hold as a lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatHold {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_order: i32,
    pub destination_order: i32,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

impl SeatHold {
    /// Lazy expiry: an expired hold counts as absent at read time, no
    /// deletion required.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Input to the atomic hold check-and-insert.
#[derive(Debug, Clone)]
pub struct PlaceHold {
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_order: i32,
    pub destination_order: i32,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    /// Server-side cap on concurrently active holds per session.
    pub max_seats_per_session: i64,
}

/// Passenger details captured at finalization. Name and contact are PII and
/// stay masked in log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerInfo {
    pub full_name: Masked<String>,
    pub contact_email: Masked<String>,
}

/// Input to the atomic hold-consuming booking insert.
#[derive(Debug, Clone)]
pub struct FinalizeBooking {
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_order: i32,
    pub destination_order: i32,
    pub hold_id: Uuid,
    pub session_id: String,
    pub passenger: PassengerInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_only_pending_and_confirmed_occupy() {
        assert!(BookingStatus::Pending.occupies());
        assert!(BookingStatus::Confirmed.occupies());
        assert!(!BookingStatus::Cancelled.occupies());
        assert!(!BookingStatus::Completed.occupies());
    }

    #[test]
    fn test_hold_expiry_boundary() {
        let now = Utc::now();
        let hold = SeatHold {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            seat_id: Uuid::new_v4(),
            origin_order: 0,
            destination_order: 2,
            session_id: "session-1".to_string(),
            expires_at: now,
        };

        // expires_at == now is already expired
        assert!(hold.is_expired(now));
        assert!(hold.is_expired(now + Duration::seconds(1)));
        assert!(!hold.is_expired(now - Duration::seconds(1)));
    }
}
