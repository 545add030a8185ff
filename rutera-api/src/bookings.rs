use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::holds::notify_change;
use crate::seatmap::resolve_segment;
use crate::session::session_id;
use crate::state::AppState;
use rutera_core::models::{FinalizeBooking, PassengerInfo};
use rutera_shared::models::events::{BookingFinalizedEvent, SeatChangeKind};
use rutera_shared::Masked;
use rutera_store::events::TOPIC_BOOKINGS_FINALIZED;

#[derive(Debug, Deserialize)]
struct PassengerPayload {
    full_name: String,
    contact_email: String,
}

#[derive(Debug, Deserialize)]
struct CommitBookingRequest {
    trip_id: Uuid,
    seat_id: Uuid,
    origin_stop: Uuid,
    destination_stop: Uuid,
    hold_id: Uuid,
    passenger: PassengerPayload,
}

#[derive(Debug, Serialize)]
struct CommitBookingResponse {
    booking_id: Uuid,
    status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/commit", post(commit_booking))
}

async fn commit_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CommitBookingRequest>,
) -> Result<Json<CommitBookingResponse>, ApiError> {
    let session = session_id(&headers)?;
    let (_trip, segment) =
        resolve_segment(&state, req.trip_id, req.origin_stop, req.destination_stop).await?;

    let booking = state
        .finalizer
        .finalize(FinalizeBooking {
            trip_id: req.trip_id,
            seat_id: req.seat_id,
            origin_order: segment.origin_order(),
            destination_order: segment.destination_order(),
            hold_id: req.hold_id,
            session_id: session,
            passenger: PassengerInfo {
                full_name: Masked(req.passenger.full_name),
                contact_email: Masked(req.passenger.contact_email),
            },
        })
        .await?;

    notify_change(&state, booking.trip_id, booking.seat_id, SeatChangeKind::Booked).await;
    if let Some(kafka) = &state.kafka {
        let event = BookingFinalizedEvent {
            booking_id: booking.id,
            trip_id: booking.trip_id,
            seat_id: booking.seat_id,
            origin_order: booking.origin_order,
            destination_order: booking.destination_order,
            finalized_at: booking.created_at.timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = kafka
                .publish(
                    TOPIC_BOOKINGS_FINALIZED,
                    &booking.trip_id.to_string(),
                    &payload,
                )
                .await;
        }
    }

    info!("Booking committed: {}", booking.id);

    Ok(Json(CommitBookingResponse {
        booking_id: booking.id,
        status: booking.status.as_str().to_string(),
    }))
}
