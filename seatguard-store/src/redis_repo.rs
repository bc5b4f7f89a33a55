use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;
use seatguard_core::cache::{AvailabilityCache, CacheError};

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await
    }
}

fn cache_error(err: redis::RedisError) -> CacheError {
    CacheError(err.to_string())
}

#[async_trait]
impl AvailabilityCache for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(cache_error)?;
        conn.get(key).await.map_err(cache_error)
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(cache_error)?;
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds).await.map_err(cache_error)?;
        debug!("Cache set: {} (ttl {}s)", key, seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(cache_error)?;
        conn.del::<_, ()>(key).await.map_err(cache_error)
    }
}
