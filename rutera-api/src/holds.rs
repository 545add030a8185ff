use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::seatmap::resolve_segment;
use crate::session::session_id;
use crate::state::AppState;
use rutera_shared::models::events::{
    HoldPlacedEvent, HoldReleasedEvent, SeatChangeKind, SeatMapChangedEvent,
};
use rutera_store::events::{TOPIC_HOLDS_PLACED, TOPIC_HOLDS_RELEASED};

#[derive(Debug, Deserialize)]
struct PlaceHoldRequest {
    trip_id: Uuid,
    seat_id: Uuid,
    origin_stop: Uuid,
    destination_stop: Uuid,
}

#[derive(Debug, Serialize)]
struct PlaceHoldResponse {
    hold_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ReleaseHoldRequest {
    trip_id: Uuid,
    seat_id: Uuid,
}

#[derive(Debug, Serialize)]
struct ReleaseHoldResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ExtendHoldRequest {
    hold_id: Uuid,
}

#[derive(Debug, Serialize)]
struct ExtendHoldResponse {
    hold_id: Uuid,
    expires_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/holds", post(place_hold).delete(release_hold))
        .route("/v1/holds/extend", post(extend_hold))
}

async fn place_hold(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PlaceHoldRequest>,
) -> Result<Json<PlaceHoldResponse>, ApiError> {
    let session = session_id(&headers)?;
    let (_trip, segment) =
        resolve_segment(&state, req.trip_id, req.origin_stop, req.destination_stop).await?;

    let hold = state
        .holds
        .place(req.trip_id, req.seat_id, segment, &session)
        .await?;

    notify_change(&state, req.trip_id, req.seat_id, SeatChangeKind::Held).await;
    if let Some(kafka) = &state.kafka {
        let event = HoldPlacedEvent {
            hold_id: hold.id,
            trip_id: hold.trip_id,
            seat_id: hold.seat_id,
            origin_order: hold.origin_order,
            destination_order: hold.destination_order,
            expires_at: hold.expires_at.timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = kafka
                .publish(TOPIC_HOLDS_PLACED, &hold.trip_id.to_string(), &payload)
                .await;
        }
    }

    Ok(Json(PlaceHoldResponse {
        hold_id: hold.id,
        expires_at: hold.expires_at,
    }))
}

async fn release_hold(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReleaseHoldRequest>,
) -> Result<Json<ReleaseHoldResponse>, ApiError> {
    let session = session_id(&headers)?;

    state
        .holds
        .release(req.trip_id, req.seat_id, &session)
        .await?;

    notify_change(&state, req.trip_id, req.seat_id, SeatChangeKind::Released).await;
    if let Some(kafka) = &state.kafka {
        let event = HoldReleasedEvent {
            trip_id: req.trip_id,
            seat_id: req.seat_id,
            released_at: Utc::now().timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = kafka
                .publish(TOPIC_HOLDS_RELEASED, &req.trip_id.to_string(), &payload)
                .await;
        }
    }

    Ok(Json(ReleaseHoldResponse {
        status: "RELEASED".to_string(),
    }))
}

async fn extend_hold(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ExtendHoldRequest>,
) -> Result<Json<ExtendHoldResponse>, ApiError> {
    let session = session_id(&headers)?;

    let hold = state.holds.extend(req.hold_id, &session).await?;

    Ok(Json(ExtendHoldResponse {
        hold_id: hold.id,
        expires_at: hold.expires_at,
    }))
}

/// Fan the mutation out to seat-map viewers and drop the cached availability
/// count so the next render re-seeds it.
pub(crate) async fn notify_change(
    state: &AppState,
    trip_id: Uuid,
    seat_id: Uuid,
    kind: SeatChangeKind,
) {
    let event = SeatMapChangedEvent {
        trip_id,
        seat_id,
        kind,
        occurred_at: Utc::now().timestamp(),
    };
    let _ = state.sse_tx.send(event);

    if let Some(redis) = &state.redis {
        let _ = redis.delete_seat_availability(&trip_id.to_string()).await;
    }
}
