use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rutera_api::{app, worker, AppState};
use rutera_core::repository::{
    BookingRepository, CatalogRepository, HoldRepository, OccupancyRepository,
};
use rutera_reservation::{FinalizeCoordinator, HoldManager, HoldPolicy, OccupancyIndex};
use rutera_store::{
    DbClient, EventProducer, PgBookingRepository, PgCatalogRepository, PgHoldRepository,
    PgOccupancyRepository, RedisClient,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rutera_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rutera_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Rutera API on port {}", config.server.port);

    // Postgres Connection
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let business_rules = match db.fetch_business_rules(config.business_rules.clone()).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!("Falling back to file business rules: {}", e);
            config.business_rules.clone()
        }
    };

    // Redis Connection
    let redis = Arc::new(
        RedisClient::new(&config.redis.url)
            .await
            .expect("Failed to connect to Redis"),
    );

    // Kafka Connection
    let kafka = Arc::new(
        EventProducer::new(&config.kafka.brokers).expect("Failed to create Kafka producer"),
    );

    // Repositories over the shared transactional store
    let catalog: Arc<dyn CatalogRepository> =
        Arc::new(PgCatalogRepository::new(db.pool.clone()));
    let occupancy_repo: Arc<dyn OccupancyRepository> =
        Arc::new(PgOccupancyRepository::new(db.pool.clone()));
    let hold_repo: Arc<dyn HoldRepository> = Arc::new(PgHoldRepository::new(db.pool.clone()));
    let booking_repo: Arc<dyn BookingRepository> =
        Arc::new(PgBookingRepository::new(db.pool.clone()));

    let occupancy = Arc::new(OccupancyIndex::new(occupancy_repo));
    let holds = Arc::new(HoldManager::new(
        catalog.clone(),
        hold_repo,
        HoldPolicy {
            ttl_seconds: business_rules.seat_hold_seconds as i64,
            max_seats_per_session: business_rules.max_seats_per_session,
        },
    ));
    let finalizer = Arc::new(FinalizeCoordinator::new(catalog.clone(), booking_repo));

    // SSE Broadcast Channel
    let (sse_tx, _) = tokio::sync::broadcast::channel(100);

    let app_state = AppState {
        catalog,
        occupancy,
        holds: holds.clone(),
        finalizer,
        redis: Some(redis.clone()),
        kafka: Some(kafka),
        sse_tx,
        business_rules: business_rules.clone(),
    };

    tokio::spawn(worker::start_hold_sweeper(
        holds,
        business_rules.sweep_interval_seconds,
    ));
    tokio::spawn(worker::start_availability_worker(
        config.kafka.brokers.clone(),
        "rutera-availability".to_string(),
        redis,
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
