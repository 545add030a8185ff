use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use rutera_catalog::{Seat, Stop, Trip};
use rutera_core::models::{
    Booking, BookingStatus, FinalizeBooking, PassengerInfo, PlaceHold, SeatHold,
};
use rutera_core::repository::{
    BookingRepository, CatalogRepository, HoldRepository, OccupancyRepository,
};
use rutera_core::{CoreError, CoreResult};
use rutera_reservation::Segment;

#[derive(Default)]
struct Inner {
    trips: HashMap<Uuid, Trip>,
    stops: HashMap<Uuid, Vec<Stop>>,
    seats: HashMap<Uuid, Vec<Seat>>,
    holds: Vec<SeatHold>,
    bookings: Vec<Booking>,
    passengers: HashMap<Uuid, PassengerInfo>,
}

/// In-memory store implementing every repository trait behind one mutex.
///
/// Holding the lock across check-and-insert gives the same atomicity the
/// Postgres advisory lock provides, which is what makes this store a valid
/// stand-in for tests and local runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_trip(&self, trip: Trip) {
        self.inner.lock().await.trips.insert(trip.id, trip);
    }

    pub async fn add_stops(&self, route_id: Uuid, mut stops: Vec<Stop>) {
        stops.sort_by_key(|s| s.stop_order);
        self.inner.lock().await.stops.insert(route_id, stops);
    }

    pub async fn add_seats(&self, bus_id: Uuid, mut seats: Vec<Seat>) {
        seats.sort_by_key(|s| (s.row_number, s.column_number));
        self.inner.lock().await.seats.insert(bus_id, seats);
    }

    /// Deactivation is the only seat mutation; historical holds and bookings
    /// referencing the seat are untouched.
    pub async fn deactivate_seat(&self, seat_id: Uuid) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;
        for seats in inner.seats.values_mut() {
            if let Some(seat) = seats.iter_mut().find(|s| s.id == seat_id) {
                seat.is_active = false;
                return Ok(());
            }
        }
        Err(CoreError::NotFound(format!("seat {}", seat_id)))
    }

    /// Test fixture seeding; production bookings only come from
    /// finalize_booking.
    pub async fn insert_booking(&self, booking: Booking) {
        self.inner.lock().await.bookings.push(booking);
    }

    pub async fn set_booking_status(&self, booking_id: Uuid, status: BookingStatus) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;
        let booking = inner
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    pub async fn hold_count(&self) -> usize {
        self.inner.lock().await.holds.len()
    }

    pub async fn passenger_for(&self, booking_id: Uuid) -> Option<PassengerInfo> {
        self.inner.lock().await.passengers.get(&booking_id).cloned()
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn get_trip(&self, trip_id: Uuid) -> CoreResult<Option<Trip>> {
        Ok(self.inner.lock().await.trips.get(&trip_id).cloned())
    }

    async fn get_stops(&self, route_id: Uuid) -> CoreResult<Vec<Stop>> {
        Ok(self
            .inner
            .lock()
            .await
            .stops
            .get(&route_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_seats(&self, bus_id: Uuid) -> CoreResult<Vec<Seat>> {
        Ok(self
            .inner
            .lock()
            .await
            .seats
            .get(&bus_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_seat(&self, seat_id: Uuid) -> CoreResult<Option<Seat>> {
        Ok(self
            .inner
            .lock()
            .await
            .seats
            .values()
            .flatten()
            .find(|s| s.id == seat_id)
            .cloned())
    }
}

#[async_trait]
impl OccupancyRepository for MemoryStore {
    async fn get_bookings_for_seat(
        &self,
        trip_id: Uuid,
        seat_id: Uuid,
    ) -> CoreResult<Vec<Booking>> {
        Ok(self
            .inner
            .lock()
            .await
            .bookings
            .iter()
            .filter(|b| b.trip_id == trip_id && b.seat_id == seat_id)
            .cloned()
            .collect())
    }

    async fn get_holds_for_seat(&self, trip_id: Uuid, seat_id: Uuid) -> CoreResult<Vec<SeatHold>> {
        // Expired rows included; expiry is applied at read time downstream
        Ok(self
            .inner
            .lock()
            .await
            .holds
            .iter()
            .filter(|h| h.trip_id == trip_id && h.seat_id == seat_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HoldRepository for MemoryStore {
    async fn place_hold(&self, cmd: &PlaceHold, now: DateTime<Utc>) -> CoreResult<SeatHold> {
        let mut inner = self.inner.lock().await;

        let candidate = Segment::new(cmd.origin_order, cmd.destination_order)?;

        // Cap before conflict: exceeding it must perform no write
        let active = inner
            .holds
            .iter()
            .filter(|h| h.session_id == cmd.session_id && !h.is_expired(now))
            .count() as i64;
        if active >= cmd.max_seats_per_session {
            return Err(CoreError::HoldLimitExceeded {
                active,
                max: cmd.max_seats_per_session,
            });
        }

        let booked = inner.bookings.iter().any(|b| {
            b.trip_id == cmd.trip_id
                && b.seat_id == cmd.seat_id
                && b.status.occupies()
                && candidate.overlaps_orders(b.origin_order, b.destination_order)
        });
        if booked {
            return Err(CoreError::Conflict(format!(
                "seat {} is booked over [{}, {})",
                cmd.seat_id, cmd.origin_order, cmd.destination_order
            )));
        }

        let held = inner.holds.iter().any(|h| {
            h.trip_id == cmd.trip_id
                && h.seat_id == cmd.seat_id
                && h.session_id != cmd.session_id
                && !h.is_expired(now)
                && candidate.overlaps_orders(h.origin_order, h.destination_order)
        });
        if held {
            return Err(CoreError::Conflict(format!(
                "seat {} is held by another session over [{}, {})",
                cmd.seat_id, cmd.origin_order, cmd.destination_order
            )));
        }

        let hold = SeatHold {
            id: Uuid::new_v4(),
            trip_id: cmd.trip_id,
            seat_id: cmd.seat_id,
            origin_order: cmd.origin_order,
            destination_order: cmd.destination_order,
            session_id: cmd.session_id.clone(),
            expires_at: cmd.expires_at,
        };
        inner.holds.push(hold.clone());
        Ok(hold)
    }

    async fn release_hold(
        &self,
        trip_id: Uuid,
        seat_id: Uuid,
        session_id: &str,
    ) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.holds.retain(|h| {
            !(h.trip_id == trip_id && h.seat_id == seat_id && h.session_id == session_id)
        });
        Ok(())
    }

    async fn extend_hold(
        &self,
        hold_id: Uuid,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<SeatHold> {
        let mut inner = self.inner.lock().await;
        let hold = inner
            .holds
            .iter_mut()
            .find(|h| h.id == hold_id && h.session_id == session_id && !h.is_expired(now))
            .ok_or_else(|| CoreError::NotFound(format!("hold {}", hold_id)))?;
        hold.expires_at = expires_at;
        Ok(hold.clone())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> CoreResult<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.holds.len();
        inner.holds.retain(|h| !h.is_expired(now));
        Ok((before - inner.holds.len()) as u64)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn finalize_booking(
        &self,
        cmd: &FinalizeBooking,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut inner = self.inner.lock().await;

        let candidate = Segment::new(cmd.origin_order, cmd.destination_order)?;

        // The hold must still be live and owned by the finalizing session
        let hold_pos = inner
            .holds
            .iter()
            .position(|h| h.id == cmd.hold_id && h.session_id == cmd.session_id && !h.is_expired(now))
            .ok_or_else(|| CoreError::NotFound(format!("hold {}", cmd.hold_id)))?;

        // Commit-time occupancy re-check: the hold is advisory, not a lock
        let booked = inner.bookings.iter().any(|b| {
            b.trip_id == cmd.trip_id
                && b.seat_id == cmd.seat_id
                && b.status.occupies()
                && candidate.overlaps_orders(b.origin_order, b.destination_order)
        });
        if booked {
            return Err(CoreError::Conflict(format!(
                "seat {} is booked over [{}, {})",
                cmd.seat_id, cmd.origin_order, cmd.destination_order
            )));
        }

        let held_by_other = inner.holds.iter().any(|h| {
            h.trip_id == cmd.trip_id
                && h.seat_id == cmd.seat_id
                && h.session_id != cmd.session_id
                && !h.is_expired(now)
                && candidate.overlaps_orders(h.origin_order, h.destination_order)
        });
        if held_by_other {
            return Err(CoreError::Conflict(format!(
                "seat {} is held by another session over [{}, {})",
                cmd.seat_id, cmd.origin_order, cmd.destination_order
            )));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            trip_id: cmd.trip_id,
            seat_id: cmd.seat_id,
            origin_order: cmd.origin_order,
            destination_order: cmd.destination_order,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.bookings.push(booking.clone());
        inner.passengers.insert(booking.id, cmd.passenger.clone());
        // Consumed in the same critical section that inserts the booking
        inner.holds.remove(hold_pos);

        Ok(booking)
    }
}
