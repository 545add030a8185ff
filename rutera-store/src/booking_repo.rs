use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::hold_repo::lock_seat_timeline;
use crate::occupancy_repo::BookingRow;
use rutera_core::models::{Booking, FinalizeBooking};
use rutera_core::repository::BookingRepository;
use rutera_core::{CoreError, CoreResult};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn upstream(e: sqlx::Error) -> CoreError {
    CoreError::Upstream(e.to_string())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn finalize_booking(
        &self,
        cmd: &FinalizeBooking,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(upstream)?;

        lock_seat_timeline(&mut tx, cmd.trip_id, cmd.seat_id)
            .await
            .map_err(upstream)?;

        // The hold must still be live and owned by the finalizing session
        let hold_exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM seat_holds \
             WHERE id = $1 AND session_id = $2 AND expires_at > $3",
        )
        .bind(cmd.hold_id)
        .bind(&cmd.session_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(upstream)?;

        if hold_exists == 0 {
            return Err(CoreError::NotFound(format!("hold {}", cmd.hold_id)));
        }

        // Commit-time occupancy re-check: the hold is advisory, not a lock
        let booked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings \
             WHERE trip_id = $1 AND seat_id = $2 \
               AND status IN ('PENDING', 'CONFIRMED') \
               AND NOT (destination_stop_order <= $3 OR origin_stop_order >= $4)",
        )
        .bind(cmd.trip_id)
        .bind(cmd.seat_id)
        .bind(cmd.origin_order)
        .bind(cmd.destination_order)
        .fetch_one(&mut *tx)
        .await
        .map_err(upstream)?;

        if booked > 0 {
            return Err(CoreError::Conflict(format!(
                "seat {} is booked over [{}, {})",
                cmd.seat_id, cmd.origin_order, cmd.destination_order
            )));
        }

        let held_by_other: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM seat_holds \
             WHERE trip_id = $1 AND seat_id = $2 \
               AND session_id <> $3 AND expires_at > $4 \
               AND NOT (destination_stop_order <= $5 OR origin_stop_order >= $6)",
        )
        .bind(cmd.trip_id)
        .bind(cmd.seat_id)
        .bind(&cmd.session_id)
        .bind(now)
        .bind(cmd.origin_order)
        .bind(cmd.destination_order)
        .fetch_one(&mut *tx)
        .await
        .map_err(upstream)?;

        if held_by_other > 0 {
            return Err(CoreError::Conflict(format!(
                "seat {} is held by another session over [{}, {})",
                cmd.seat_id, cmd.origin_order, cmd.destination_order
            )));
        }

        let booking_id = Uuid::new_v4();
        let row: BookingRow = sqlx::query_as(
            "INSERT INTO bookings (id, trip_id, seat_id, origin_stop_order, destination_stop_order, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $6) \
             RETURNING id, trip_id, seat_id, origin_stop_order, destination_stop_order, status, created_at, updated_at",
        )
        .bind(booking_id)
        .bind(cmd.trip_id)
        .bind(cmd.seat_id)
        .bind(cmd.origin_order)
        .bind(cmd.destination_order)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(upstream)?;

        sqlx::query(
            "INSERT INTO booking_passengers (booking_id, full_name, contact_email) VALUES ($1, $2, $3)",
        )
        .bind(booking_id)
        .bind(&cmd.passenger.full_name.0)
        .bind(&cmd.passenger.contact_email.0)
        .execute(&mut *tx)
        .await
        .map_err(upstream)?;

        // Consumed in the same transaction that inserts the booking
        sqlx::query("DELETE FROM seat_holds WHERE id = $1")
            .bind(cmd.hold_id)
            .execute(&mut *tx)
            .await
            .map_err(upstream)?;

        tx.commit().await.map_err(upstream)?;

        Booking::try_from(row)
    }
}
