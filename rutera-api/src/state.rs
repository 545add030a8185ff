use std::sync::Arc;
use tokio::sync::broadcast;

use rutera_core::repository::CatalogRepository;
use rutera_reservation::{FinalizeCoordinator, HoldManager, OccupancyIndex};
use rutera_shared::models::events::SeatMapChangedEvent;
use rutera_store::app_config::BusinessRules;
use rutera_store::{EventProducer, RedisClient};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub occupancy: Arc<OccupancyIndex>,
    pub holds: Arc<HoldManager>,
    pub finalizer: Arc<FinalizeCoordinator>,
    /// Absent when running against the in-memory store (tests, local dev)
    pub redis: Option<Arc<RedisClient>>,
    pub kafka: Option<Arc<EventProducer>>,
    pub sse_tx: broadcast::Sender<SeatMapChangedEvent>,
    pub business_rules: BusinessRules,
}
