use redis::{AsyncCommands, RedisResult};

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Cached count of seats currently selectable on a trip, seeded by the
    /// seat-map render and kept honest by the availability worker.
    pub async fn get_seat_availability(&self, trip_id: &str) -> RedisResult<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        conn.get(key).await
    }

    pub async fn set_seat_availability(&self, trip_id: &str, count: i64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        conn.set(key, count).await
    }

    pub async fn decr_seat_availability(&self, trip_id: &str) -> RedisResult<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        // If the key exists, DECR it. If not, return nil and let the next
        // seat-map render re-seed it; seeding here could go negative.
        let script = redis::Script::new(
            r#"
            if redis.call("EXISTS", KEYS[1]) == 1 then
                return redis.call("DECR", KEYS[1])
            else
                return nil
            end
        "#,
        );

        script.key(key).invoke_async(&mut conn).await
    }

    pub async fn delete_seat_availability(&self, trip_id: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("trip:{}:availability", trip_id);
        conn.del(key).await
    }

    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}
