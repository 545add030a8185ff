use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use rutera_core::models::{Booking, BookingStatus, SeatHold};
use rutera_core::repository::OccupancyRepository;
use rutera_core::{CoreError, CoreResult};

pub struct PgOccupancyRepository {
    pool: PgPool,
}

impl PgOccupancyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_stop_order: i32,
    pub destination_stop_order: i32,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "PENDING" => BookingStatus::Pending,
            "CONFIRMED" => BookingStatus::Confirmed,
            "CANCELLED" => BookingStatus::Cancelled,
            "COMPLETED" => BookingStatus::Completed,
            other => {
                return Err(CoreError::Upstream(format!(
                    "unknown booking status '{}' for booking {}",
                    other, row.id
                )))
            }
        };
        Ok(Booking {
            id: row.id,
            trip_id: row.trip_id,
            seat_id: row.seat_id,
            origin_order: row.origin_stop_order,
            destination_order: row.destination_stop_order,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct HoldRow {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub seat_id: Uuid,
    pub origin_stop_order: i32,
    pub destination_stop_order: i32,
    pub session_id: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<HoldRow> for SeatHold {
    fn from(row: HoldRow) -> Self {
        SeatHold {
            id: row.id,
            trip_id: row.trip_id,
            seat_id: row.seat_id,
            origin_order: row.origin_stop_order,
            destination_order: row.destination_stop_order,
            session_id: row.session_id,
            expires_at: row.expires_at,
        }
    }
}

fn upstream(e: sqlx::Error) -> CoreError {
    CoreError::Upstream(e.to_string())
}

#[async_trait]
impl OccupancyRepository for PgOccupancyRepository {
    async fn get_bookings_for_seat(
        &self,
        trip_id: Uuid,
        seat_id: Uuid,
    ) -> CoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT id, trip_id, seat_id, origin_stop_order, destination_stop_order, status, created_at, updated_at \
             FROM bookings WHERE trip_id = $1 AND seat_id = $2",
        )
        .bind(trip_id)
        .bind(seat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(upstream)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn get_holds_for_seat(&self, trip_id: Uuid, seat_id: Uuid) -> CoreResult<Vec<SeatHold>> {
        // Expired rows come back too; the occupancy index drops them at read
        // time.
        let rows: Vec<HoldRow> = sqlx::query_as(
            "SELECT id, trip_id, seat_id, origin_stop_order, destination_stop_order, session_id, expires_at \
             FROM seat_holds WHERE trip_id = $1 AND seat_id = $2",
        )
        .bind(trip_id)
        .bind(seat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(upstream)?;

        Ok(rows.into_iter().map(SeatHold::from).collect())
    }
}
