use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::segment::Segment;
use rutera_core::models::{Booking, FinalizeBooking};
use rutera_core::repository::{BookingRepository, CatalogRepository};
use rutera_core::{CoreError, CoreResult};

/// Coordinates consuming a hold into a persisted booking.
///
/// The hold is advisory, not a lock: occupancy is re-checked at commit time
/// inside the store transaction that inserts the booking and deletes the
/// hold.
pub struct FinalizeCoordinator {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl FinalizeCoordinator {
    pub fn new(catalog: Arc<dyn CatalogRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { catalog, bookings }
    }

    pub async fn finalize(&self, cmd: FinalizeBooking) -> CoreResult<Booking> {
        // Shape checks before touching the store
        Segment::new(cmd.origin_order, cmd.destination_order)?;

        let seat = self
            .catalog
            .get_seat(cmd.seat_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("seat {}", cmd.seat_id)))?;
        if !seat.is_active {
            return Err(CoreError::Validation(format!(
                "seat {} is deactivated",
                cmd.seat_id
            )));
        }

        let booking = self.bookings.finalize_booking(&cmd, Utc::now()).await?;
        info!(
            "Booking finalized: {} trip {} seat {} [{}, {})",
            booking.id,
            booking.trip_id,
            booking.seat_id,
            booking.origin_order,
            booking.destination_order
        );
        Ok(booking)
    }
}
