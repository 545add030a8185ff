use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use rutera_catalog::{Seat, Stop, Trip};
use rutera_core::repository::CatalogRepository;
use rutera_core::{CoreError, CoreResult};

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    route_id: Uuid,
    bus_id: Uuid,
    departs_at: chrono::DateTime<chrono::Utc>,
}

#[derive(sqlx::FromRow)]
struct StopRow {
    id: Uuid,
    route_id: Uuid,
    stop_order: i32,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    bus_id: Uuid,
    row_number: i32,
    column_number: i32,
    is_active: bool,
}

impl From<SeatRow> for Seat {
    fn from(row: SeatRow) -> Self {
        Seat {
            id: row.id,
            bus_id: row.bus_id,
            row_number: row.row_number,
            column_number: row.column_number,
            is_active: row.is_active,
        }
    }
}

fn upstream(e: sqlx::Error) -> CoreError {
    CoreError::Upstream(e.to_string())
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn get_trip(&self, trip_id: Uuid) -> CoreResult<Option<Trip>> {
        let row: Option<TripRow> =
            sqlx::query_as("SELECT id, route_id, bus_id, departs_at FROM trips WHERE id = $1")
                .bind(trip_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(upstream)?;

        Ok(row.map(|r| Trip {
            id: r.id,
            route_id: r.route_id,
            bus_id: r.bus_id,
            departs_at: r.departs_at,
        }))
    }

    async fn get_stops(&self, route_id: Uuid) -> CoreResult<Vec<Stop>> {
        let rows: Vec<StopRow> = sqlx::query_as(
            "SELECT id, route_id, stop_order FROM stops WHERE route_id = $1 ORDER BY stop_order",
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await
        .map_err(upstream)?;

        Ok(rows
            .into_iter()
            .map(|r| Stop {
                id: r.id,
                route_id: r.route_id,
                stop_order: r.stop_order,
            })
            .collect())
    }

    async fn get_seats(&self, bus_id: Uuid) -> CoreResult<Vec<Seat>> {
        let rows: Vec<SeatRow> = sqlx::query_as(
            "SELECT id, bus_id, row_number, column_number, is_active FROM seats WHERE bus_id = $1 ORDER BY row_number, column_number",
        )
        .bind(bus_id)
        .fetch_all(&self.pool)
        .await
        .map_err(upstream)?;

        Ok(rows.into_iter().map(Seat::from).collect())
    }

    async fn get_seat(&self, seat_id: Uuid) -> CoreResult<Option<Seat>> {
        let row: Option<SeatRow> = sqlx::query_as(
            "SELECT id, bus_id, row_number, column_number, is_active FROM seats WHERE id = $1",
        )
        .bind(seat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(upstream)?;

        Ok(row.map(Seat::from))
    }
}
