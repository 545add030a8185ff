use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::occupancy_repo::HoldRow;
use rutera_core::models::{PlaceHold, SeatHold};
use rutera_core::repository::HoldRepository;
use rutera_core::{CoreError, CoreResult};

pub struct PgHoldRepository {
    pool: PgPool,
}

impl PgHoldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn upstream(e: sqlx::Error) -> CoreError {
    CoreError::Upstream(e.to_string())
}

/// Serializes every writer of one (trip, seat) occupancy timeline for the
/// duration of the transaction. Lazy expiry rules out a plain exclusion
/// constraint for holds, so this lock is what makes check-and-insert atomic.
pub(crate) async fn lock_seat_timeline(
    tx: &mut Transaction<'_, Postgres>,
    trip_id: Uuid,
    seat_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("{}:{}", trip_id, seat_id))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl HoldRepository for PgHoldRepository {
    async fn place_hold(&self, cmd: &PlaceHold, now: DateTime<Utc>) -> CoreResult<SeatHold> {
        let mut tx = self.pool.begin().await.map_err(upstream)?;

        lock_seat_timeline(&mut tx, cmd.trip_id, cmd.seat_id)
            .await
            .map_err(upstream)?;

        // Cap before conflict: exceeding it must perform no write
        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM seat_holds WHERE session_id = $1 AND expires_at > $2",
        )
        .bind(&cmd.session_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(upstream)?;

        if active >= cmd.max_seats_per_session {
            return Err(CoreError::HoldLimitExceeded {
                active,
                max: cmd.max_seats_per_session,
            });
        }

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

        // Holds of the requesting session are transparent to it
        let held: i64 = sqlx::query_scalar(
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

        if held > 0 {
            return Err(CoreError::Conflict(format!(
                "seat {} is held by another session over [{}, {})",
                cmd.seat_id, cmd.origin_order, cmd.destination_order
            )));
        }

        let row: HoldRow = sqlx::query_as(
            "INSERT INTO seat_holds (id, trip_id, seat_id, origin_stop_order, destination_stop_order, session_id, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, trip_id, seat_id, origin_stop_order, destination_stop_order, session_id, expires_at",
        )
        .bind(Uuid::new_v4())
        .bind(cmd.trip_id)
        .bind(cmd.seat_id)
        .bind(cmd.origin_order)
        .bind(cmd.destination_order)
        .bind(&cmd.session_id)
        .bind(cmd.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(upstream)?;

        tx.commit().await.map_err(upstream)?;

        Ok(SeatHold::from(row))
    }

    async fn release_hold(
        &self,
        trip_id: Uuid,
        seat_id: Uuid,
        session_id: &str,
    ) -> CoreResult<()> {
        sqlx::query("DELETE FROM seat_holds WHERE trip_id = $1 AND seat_id = $2 AND session_id = $3")
            .bind(trip_id)
            .bind(seat_id)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(upstream)?;
        Ok(())
    }

    async fn extend_hold(
        &self,
        hold_id: Uuid,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<SeatHold> {
        let row: Option<HoldRow> = sqlx::query_as(
            "UPDATE seat_holds SET expires_at = $1 \
             WHERE id = $2 AND session_id = $3 AND expires_at > $4 \
             RETURNING id, trip_id, seat_id, origin_stop_order, destination_stop_order, session_id, expires_at",
        )
        .bind(expires_at)
        .bind(hold_id)
        .bind(session_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(upstream)?;

        row.map(SeatHold::from)
            .ok_or_else(|| CoreError::NotFound(format!("hold {}", hold_id)))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM seat_holds WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(upstream)?;
        Ok(result.rows_affected())
    }
}
