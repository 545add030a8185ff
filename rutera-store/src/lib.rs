pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod events;
pub mod hold_repo;
pub mod memory;
pub mod occupancy_repo;
pub mod redis_repo;

pub use booking_repo::PgBookingRepository;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use hold_repo::PgHoldRepository;
pub use memory::MemoryStore;
pub use occupancy_repo::PgOccupancyRepository;
pub use redis_repo::RedisClient;
