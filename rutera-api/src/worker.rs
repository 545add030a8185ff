use std::sync::Arc;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info};

use rutera_reservation::HoldManager;
use rutera_shared::models::events::{BookingFinalizedEvent, HoldPlacedEvent, HoldReleasedEvent};
use rutera_store::events::{TOPIC_BOOKINGS_FINALIZED, TOPIC_HOLDS_PLACED, TOPIC_HOLDS_RELEASED};
use rutera_store::RedisClient;

/// Expired holds are already invisible to reads; this loop only keeps the
/// table from accumulating stale rows.
pub async fn start_hold_sweeper(holds: Arc<HoldManager>, interval_seconds: u64) {
    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(interval_seconds.max(1)));

    info!("Hold sweeper started ({}s cadence)", interval_seconds.max(1));

    loop {
        ticker.tick().await;
        match holds.sweep_expired().await {
            Ok(0) => {}
            Ok(swept) => info!("Swept {} expired seat holds", swept),
            Err(e) => error!("Hold sweep failed: {}", e),
        }
    }
}

/// Keeps the cached per-trip availability count honest: bookings decrement
/// it, hold churn drops it so the next seat-map render re-seeds it.
pub async fn start_availability_worker(brokers: String, group_id: String, redis: Arc<RedisClient>) {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()
        .expect("Consumer creation failed");

    consumer
        .subscribe(&[
            TOPIC_HOLDS_PLACED,
            TOPIC_HOLDS_RELEASED,
            TOPIC_BOOKINGS_FINALIZED,
        ])
        .expect("Can't subscribe");

    info!("Availability worker started, listening to reservation events...");

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                let payload = match m.payload_view::<str>() {
                    Some(Ok(payload)) => payload,
                    Some(Err(e)) => {
                        error!("Error reading payload: {}", e);
                        continue;
                    }
                    None => continue,
                };

                if let Err(e) = apply_event(&redis, m.topic(), payload).await {
                    error!("Failed to update availability: {}", e);
                }
            }
        }
    }
}

async fn apply_event(
    redis: &RedisClient,
    topic: &str,
    payload: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match topic {
        TOPIC_BOOKINGS_FINALIZED => {
            let event: BookingFinalizedEvent = serde_json::from_str(payload)?;
            let trip_id = event.trip_id.to_string();
            match redis.decr_seat_availability(&trip_id).await? {
                Some(remaining) => {
                    info!("Decremented availability for trip {}: {}", trip_id, remaining)
                }
                None => info!(
                    "Cache miss for trip {}, skipping decrement (will be seeded on next render)",
                    trip_id
                ),
            }
        }
        TOPIC_HOLDS_PLACED => {
            let event: HoldPlacedEvent = serde_json::from_str(payload)?;
            redis
                .delete_seat_availability(&event.trip_id.to_string())
                .await?;
        }
        TOPIC_HOLDS_RELEASED => {
            let event: HoldReleasedEvent = serde_json::from_str(payload)?;
            redis
                .delete_seat_availability(&event.trip_id.to_string())
                .await?;
        }
        other => info!("Ignoring event on unexpected topic {}", other),
    }

    Ok(())
}
