use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use rutera_api::{app, AppState};
use rutera_catalog::{Seat, Stop, Trip};
use rutera_core::models::{Booking, BookingStatus};
use rutera_core::repository::CatalogRepository;
use rutera_reservation::{FinalizeCoordinator, HoldManager, HoldPolicy, OccupancyIndex};
use rutera_store::app_config::BusinessRules;
use rutera_store::MemoryStore;

struct TestApp {
    router: Router,
    store: MemoryStore,
    trip_id: Uuid,
    stop_ids: Vec<Uuid>,
    seat_ids: Vec<Uuid>,
}

/// Route A-B-C-D (orders 0..=3), one bus with two seats, no external
/// services: Redis and Kafka are absent, as in local development.
async fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let route_id = Uuid::new_v4();
    let bus_id = Uuid::new_v4();
    let trip_id = Uuid::new_v4();

    let stops: Vec<Stop> = (0..4)
        .map(|order| Stop {
            id: Uuid::new_v4(),
            route_id,
            stop_order: order,
        })
        .collect();
    let stop_ids = stops.iter().map(|s| s.id).collect();
    store.add_stops(route_id, stops).await;

    let seats: Vec<Seat> = (1..=2)
        .map(|row| Seat {
            id: Uuid::new_v4(),
            bus_id,
            row_number: row,
            column_number: 1,
            is_active: true,
        })
        .collect();
    let seat_ids = seats.iter().map(|s| s.id).collect();
    store.add_seats(bus_id, seats).await;

    store
        .add_trip(Trip {
            id: trip_id,
            route_id,
            bus_id,
            departs_at: Utc::now() + chrono::Duration::days(1),
        })
        .await;

    let catalog: Arc<dyn CatalogRepository> = Arc::new(store.clone());
    let occupancy = Arc::new(OccupancyIndex::new(Arc::new(store.clone())));
    let holds = Arc::new(HoldManager::new(
        catalog.clone(),
        Arc::new(store.clone()),
        HoldPolicy::default(),
    ));
    let finalizer = Arc::new(FinalizeCoordinator::new(
        catalog.clone(),
        Arc::new(store.clone()),
    ));
    let (sse_tx, _) = tokio::sync::broadcast::channel(16);

    let router = app(AppState {
        catalog,
        occupancy,
        holds,
        finalizer,
        redis: None,
        kafka: None,
        sse_tx,
        business_rules: BusinessRules::default(),
    });

    TestApp {
        router,
        store,
        trip_id,
        stop_ids,
        seat_ids,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn seat_map_request(app: &TestApp, origin: Uuid, destination: Uuid, session: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(format!(
            "/v1/trips/{}/seat-map?origin_stop={}&destination_stop={}",
            app.trip_id, origin, destination
        ))
        .header("x-session-id", session)
        .body(Body::empty())
        .unwrap()
}

fn place_hold_request(app: &TestApp, seat_id: Uuid, origin: Uuid, destination: Uuid, session: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/v1/holds")
        .header("x-session-id", session)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "trip_id": app.trip_id,
                "seat_id": seat_id,
                "origin_stop": origin,
                "destination_stop": destination,
            })
            .to_string(),
        ))
        .unwrap()
}

fn release_hold_request(app: &TestApp, seat_id: Uuid, session: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri("/v1/holds")
        .header("x-session-id", session)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "trip_id": app.trip_id,
                "seat_id": seat_id,
            })
            .to_string(),
        ))
        .unwrap()
}

fn seat_status(body: &Value, seat_id: Uuid) -> (String, bool) {
    let entry = body["seats"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["seat"]["id"] == json!(seat_id))
        .unwrap();
    (
        entry["status"].as_str().unwrap().to_string(),
        entry["is_selectable"].as_bool().unwrap(),
    )
}

#[tokio::test]
async fn test_seat_map_sub_segment_visibility() {
    let app = test_app().await;
    let seat = app.seat_ids[0];

    // Seat booked A->C before anyone looks at the map
    let now = Utc::now();
    app.store
        .insert_booking(Booking {
            id: Uuid::new_v4(),
            trip_id: app.trip_id,
            seat_id: seat,
            origin_order: 0,
            destination_order: 2,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        })
        .await;

    // A viewer travelling C->D sees the seat available
    let (status, body) = send(
        &app.router,
        seat_map_request(&app, app.stop_ids[2], app.stop_ids[3], "viewer-1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin_order"], 2);
    assert_eq!(body["destination_order"], 3);
    let (display, selectable) = seat_status(&body, seat);
    assert_eq!(display, "available");
    assert!(selectable);

    // A viewer travelling A->C sees it booked
    let (status, body) = send(
        &app.router,
        seat_map_request(&app, app.stop_ids[0], app.stop_ids[2], "viewer-1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (display, selectable) = seat_status(&body, seat);
    assert_eq!(display, "booked");
    assert!(!selectable);
}

#[tokio::test]
async fn test_hold_place_and_view_per_session() {
    let app = test_app().await;
    let seat = app.seat_ids[0];

    let (status, body) = send(
        &app.router,
        place_hold_request(&app, seat, app.stop_ids[0], app.stop_ids[2], "session-a"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["hold_id"].is_string());

    // The holder sees "selected", everyone else "reserved"
    let (_, body) = send(
        &app.router,
        seat_map_request(&app, app.stop_ids[0], app.stop_ids[2], "session-a"),
    )
    .await;
    let (display, selectable) = seat_status(&body, seat);
    assert_eq!(display, "selected");
    assert!(selectable);

    let (_, body) = send(
        &app.router,
        seat_map_request(&app, app.stop_ids[0], app.stop_ids[2], "session-b"),
    )
    .await;
    let (display, selectable) = seat_status(&body, seat);
    assert_eq!(display, "reserved");
    assert!(!selectable);

    // Overlapping selection from another session conflicts...
    let (status, _) = send(
        &app.router,
        place_hold_request(&app, seat, app.stop_ids[1], app.stop_ids[3], "session-b"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // ...but the adjacent segment is free to take
    let (status, _) = send(
        &app.router,
        place_hold_request(&app, seat, app.stop_ids[2], app.stop_ids[3], "session-b"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_hold_cap_per_session() {
    let app = test_app().await;

    let (status, _) = send(
        &app.router,
        place_hold_request(
            &app,
            app.seat_ids[0],
            app.stop_ids[0],
            app.stop_ids[2],
            "session-a",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        place_hold_request(
            &app,
            app.seat_ids[1],
            app.stop_ids[0],
            app.stop_ids[2],
            "session-a",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Hold limit"));
}

#[tokio::test]
async fn test_release_is_idempotent_over_http() {
    let app = test_app().await;
    let seat = app.seat_ids[0];

    let (status, _) = send(
        &app.router,
        place_hold_request(&app, seat, app.stop_ids[0], app.stop_ids[2], "session-a"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, release_hold_request(&app, seat, "session-a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "RELEASED");

    // Releasing again, or releasing a seat that was never held, still succeeds
    let (status, _) = send(&app.router, release_hold_request(&app, seat, "session-a")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app.router,
        release_hold_request(&app, app.seat_ids[1], "session-a"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.store.hold_count().await, 0);
}

#[tokio::test]
async fn test_commit_booking_consumes_hold() {
    let app = test_app().await;
    let seat = app.seat_ids[0];

    let (status, body) = send(
        &app.router,
        place_hold_request(&app, seat, app.stop_ids[0], app.stop_ids[2], "session-a"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hold_id = body["hold_id"].as_str().unwrap().to_string();

    let commit = Request::builder()
        .method(Method::POST)
        .uri("/v1/bookings/commit")
        .header("x-session-id", "session-a")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "trip_id": app.trip_id,
                "seat_id": seat,
                "origin_stop": app.stop_ids[0],
                "destination_stop": app.stop_ids[2],
                "hold_id": hold_id,
                "passenger": {
                    "full_name": "Ana Petrova",
                    "contact_email": "ana@example.com",
                },
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app.router, commit).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");

    // The hold is consumed and the segment now shows as booked to everyone
    assert_eq!(app.store.hold_count().await, 0);
    let (_, body) = send(
        &app.router,
        seat_map_request(&app, app.stop_ids[0], app.stop_ids[2], "session-a"),
    )
    .await;
    let (display, _) = seat_status(&body, seat);
    assert_eq!(display, "booked");

    // And further overlapping selections conflict
    let (status, _) = send(
        &app.router,
        place_hold_request(&app, seat, app.stop_ids[1], app.stop_ids[2], "session-b"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_session_header_is_rejected() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!(
            "/v1/trips/{}/seat-map?origin_stop={}&destination_stop={}",
            app.trip_id, app.stop_ids[0], app.stop_ids[1]
        ))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("X-Session-Id"));
}

#[tokio::test]
async fn test_unknown_trip_is_not_found() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri(format!(
            "/v1/trips/{}/seat-map?origin_stop={}&destination_stop={}",
            Uuid::new_v4(),
            app.stop_ids[0],
            app.stop_ids[1]
        ))
        .header("x-session-id", "session-a")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backwards_segment_is_rejected() {
    let app = test_app().await;

    let (status, _) = send(
        &app.router,
        seat_map_request(&app, app.stop_ids[2], app.stop_ids[0], "session-a"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_availability_endpoint_without_cache() {
    let app = test_app().await;

    // No Redis wired: the endpoint degrades to an unseeded count
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/v1/trips/{}/availability", app.trip_id))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["available_seats"].is_null());
}
