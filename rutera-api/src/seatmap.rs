use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::session_id;
use crate::state::AppState;
use rutera_catalog::{SeatLayout, StopSequence, Trip};
use rutera_core::CoreError;
use rutera_reservation::{project_seat_map, SeatDisplay, Segment};

#[derive(Debug, Deserialize)]
struct SeatMapQuery {
    origin_stop: Uuid,
    destination_stop: Uuid,
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    trip_id: Uuid,
    origin_order: i32,
    destination_order: i32,
    seats: Vec<SeatDisplay>,
    available_count: usize,
}

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    trip_id: Uuid,
    /// None until a seat-map render has seeded the cache
    available_seats: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/{trip_id}/seat-map", get(seat_map))
        .route("/v1/trips/{trip_id}/availability", get(availability))
        .route("/v1/trips/{trip_id}/stream", get(trip_stream))
}

/// Resolve a trip plus an (origin stop, destination stop) pair into the
/// stop-order segment the reservation core works with.
pub(crate) async fn resolve_segment(
    state: &AppState,
    trip_id: Uuid,
    origin_stop: Uuid,
    destination_stop: Uuid,
) -> Result<(Trip, Segment), ApiError> {
    let trip = state
        .catalog
        .get_trip(trip_id)
        .await?
        .ok_or_else(|| ApiError::Core(CoreError::NotFound(format!("trip {}", trip_id))))?;

    let stops = state.catalog.get_stops(trip.route_id).await?;
    let sequence = StopSequence::new(trip.route_id, stops)?;
    let (origin, destination) = sequence.segment_orders(origin_stop, destination_stop)?;
    let segment = Segment::new(origin, destination)?;

    Ok((trip, segment))
}

async fn seat_map(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Query(query): Query<SeatMapQuery>,
    headers: HeaderMap,
) -> Result<Json<SeatMapResponse>, ApiError> {
    let session = session_id(&headers)?;
    let (trip, segment) =
        resolve_segment(&state, trip_id, query.origin_stop, query.destination_stop).await?;

    let seats = state.catalog.get_seats(trip.bus_id).await?;
    let layout = SeatLayout::new(trip.bus_id, seats)?;

    let now = Utc::now();
    let mut entries = Vec::with_capacity(layout.seat_count());
    for seat in layout.seats() {
        let status = state
            .occupancy
            .classify(trip_id, seat.id, segment, &session, now)
            .await?;
        entries.push((seat.clone(), status));
    }

    let seats = project_seat_map(entries);
    let available_count = seats.iter().filter(|d| d.is_selectable).count();

    // Seed the availability cache; the worker keeps it honest afterwards
    if let Some(redis) = &state.redis {
        if let Err(e) = redis
            .set_seat_availability(&trip_id.to_string(), available_count as i64)
            .await
        {
            warn!("Failed to seed availability cache: {}", e);
        }
    }

    Ok(Json(SeatMapResponse {
        trip_id,
        origin_order: segment.origin_order(),
        destination_order: segment.destination_order(),
        seats,
        available_count,
    }))
}

async fn availability(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let available_seats = match &state.redis {
        Some(redis) => redis
            .get_seat_availability(&trip_id.to_string())
            .await
            .map_err(|e| ApiError::Core(CoreError::Upstream(e.to_string())))?,
        None => None,
    };

    Ok(Json(AvailabilityResponse {
        trip_id,
        available_seats,
    }))
}

/// Per-trip change feed: every hold or booking mutation on the trip shows up
/// here, and clients re-render the seat map on each event.
async fn trip_stream(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();

    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(move |result| {
        async move {
            match result {
                Ok(event) if event.trip_id == trip_id => Some(Ok(Event::default()
                    .event("seat_map_changed")
                    .data(serde_json::to_string(&event).unwrap_or_default()))),
                _ => None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
