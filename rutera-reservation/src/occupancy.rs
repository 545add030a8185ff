use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::segment::Segment;
use rutera_core::models::{Booking, SeatHold};
use rutera_core::repository::OccupancyRepository;
use rutera_core::CoreResult;

/// Classification of a candidate segment on one seat, for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    /// No booking or live hold overlaps the candidate.
    Free,
    /// A pending/confirmed booking overlaps. Outranks any hold.
    Booked,
    /// A live hold from another session overlaps.
    ReservedByOther,
    /// Only the viewer's own live hold overlaps.
    SelectedByViewer,
}

/// Classify a candidate segment against already-fetched occupancy rows.
///
/// Precedence: Booked > ReservedByOther > SelectedByViewer > Free. Expired
/// holds are invisible here whether or not they have been deleted, so two
/// reads straddling an expiry instant classify differently without any write
/// in between.
pub fn classify_segment(
    bookings: &[Booking],
    holds: &[SeatHold],
    candidate: Segment,
    viewer_session: &str,
    now: DateTime<Utc>,
) -> SegmentStatus {
    let booked = bookings.iter().any(|b| {
        b.status.occupies() && candidate.overlaps_orders(b.origin_order, b.destination_order)
    });
    if booked {
        return SegmentStatus::Booked;
    }

    let mut own_hold = false;
    for hold in holds {
        if hold.is_expired(now) {
            continue;
        }
        if !candidate.overlaps_orders(hold.origin_order, hold.destination_order) {
            continue;
        }
        if hold.session_id == viewer_session {
            own_hold = true;
        } else {
            return SegmentStatus::ReservedByOther;
        }
    }

    if own_hold {
        SegmentStatus::SelectedByViewer
    } else {
        SegmentStatus::Free
    }
}

/// Segment Occupancy Index: the read-side classifier over the backing store.
///
/// Side-effect free and safe to call concurrently and arbitrarily often; it
/// runs for every seat on every seat-map render.
pub struct OccupancyIndex {
    occupancy: Arc<dyn OccupancyRepository>,
}

impl OccupancyIndex {
    pub fn new(occupancy: Arc<dyn OccupancyRepository>) -> Self {
        Self { occupancy }
    }

    pub async fn classify(
        &self,
        trip_id: Uuid,
        seat_id: Uuid,
        candidate: Segment,
        viewer_session: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<SegmentStatus> {
        let bookings = self.occupancy.get_bookings_for_seat(trip_id, seat_id).await?;
        let holds = self.occupancy.get_holds_for_seat(trip_id, seat_id).await?;
        Ok(classify_segment(
            &bookings,
            &holds,
            candidate,
            viewer_session,
            now,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rutera_core::models::BookingStatus;

    fn booking(origin: i32, destination: i32, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            seat_id: Uuid::new_v4(),
            origin_order: origin,
            destination_order: destination,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn hold(origin: i32, destination: i32, session: &str, expires_at: DateTime<Utc>) -> SeatHold {
        SeatHold {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            seat_id: Uuid::new_v4(),
            origin_order: origin,
            destination_order: destination,
            session_id: session.to_string(),
            expires_at,
        }
    }

    fn seg(origin: i32, destination: i32) -> Segment {
        Segment::new(origin, destination).unwrap()
    }

    #[test]
    fn test_free_seat() {
        let now = Utc::now();
        let status = classify_segment(&[], &[], seg(0, 3), "viewer", now);
        assert_eq!(status, SegmentStatus::Free);
    }

    #[test]
    fn test_booked_outranks_foreign_hold() {
        let now = Utc::now();
        let bookings = vec![booking(0, 2, BookingStatus::Confirmed)];
        let holds = vec![hold(1, 3, "other", now + Duration::minutes(5))];

        let status = classify_segment(&bookings, &holds, seg(1, 2), "viewer", now);
        assert_eq!(status, SegmentStatus::Booked);
    }

    #[test]
    fn test_cancelled_booking_frees_segment() {
        let now = Utc::now();
        let bookings = vec![booking(0, 2, BookingStatus::Cancelled)];

        let status = classify_segment(&bookings, &[], seg(0, 2), "viewer", now);
        assert_eq!(status, SegmentStatus::Free);
    }

    #[test]
    fn test_foreign_hold_reserves() {
        let now = Utc::now();
        let holds = vec![hold(1, 3, "other", now + Duration::minutes(5))];

        let status = classify_segment(&[], &holds, seg(2, 4), "viewer", now);
        assert_eq!(status, SegmentStatus::ReservedByOther);
    }

    #[test]
    fn test_own_hold_is_transparent_but_reported() {
        let now = Utc::now();
        let holds = vec![hold(1, 3, "viewer", now + Duration::minutes(5))];

        let status = classify_segment(&[], &holds, seg(1, 3), "viewer", now);
        assert_eq!(status, SegmentStatus::SelectedByViewer);
    }

    #[test]
    fn test_expiry_is_observable_without_a_write() {
        let now = Utc::now();
        let holds = vec![hold(1, 3, "other", now + Duration::seconds(30))];

        // Same rows, two instants: before expiry the segment is reserved,
        // after expiry it is free, with no deletion in between.
        let before = classify_segment(&[], &holds, seg(1, 3), "viewer", now);
        let after = classify_segment(&[], &holds, seg(1, 3), "viewer", now + Duration::seconds(31));
        assert_eq!(before, SegmentStatus::ReservedByOther);
        assert_eq!(after, SegmentStatus::Free);
    }

    #[test]
    fn test_adjacent_booking_does_not_block() {
        let now = Utc::now();
        let bookings = vec![booking(0, 3, BookingStatus::Confirmed)];

        let status = classify_segment(&bookings, &[], seg(3, 6), "viewer", now);
        assert_eq!(status, SegmentStatus::Free);
    }

    #[test]
    fn test_route_scenario_precedence() {
        // Stops 0,1,2,3 (A,B,C,D). Seat booked A->C, held B->D by another
        // session.
        let now = Utc::now();
        let bookings = vec![booking(0, 2, BookingStatus::Confirmed)];
        let holds = vec![hold(1, 3, "second-viewer", now + Duration::minutes(5))];

        // C->D misses the booking but hits the hold
        assert_eq!(
            classify_segment(&bookings, &holds, seg(2, 3), "viewer", now),
            SegmentStatus::ReservedByOther
        );
        // A->B hits the booking; Booked wins even though the hold overlaps
        // other parts of the timeline
        assert_eq!(
            classify_segment(&bookings, &holds, seg(0, 1), "viewer", now),
            SegmentStatus::Booked
        );
        // B->D hits both; Booked still wins
        assert_eq!(
            classify_segment(&bookings, &holds, seg(1, 3), "viewer", now),
            SegmentStatus::Booked
        );
        // Without the booking, C->D would be free once the hold expires
        assert_eq!(
            classify_segment(&bookings, &holds, seg(2, 3), "viewer", now + chrono::Duration::minutes(6)),
            SegmentStatus::Free
        );
    }
}
