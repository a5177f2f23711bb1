//! Redis-backed rate limiter for multi-instance deployments.
//!
//! `INCR` on a per-key counter, `EXPIRE` when the counter is created.
//! Windows survive restarts and are shared by every instance.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self { conn, config }
    }

    /// Opens a multiplexed connection to `url`.
    pub async fn connect(url: &str, config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn, config))
    }

    async fn ttl_secs(
        conn: &mut MultiplexedConnection,
        key: &str,
        window_secs: u32,
    ) -> Result<u64, RateLimitError> {
        let ttl: i64 = conn.ttl(key).await.map_err(unavailable)?;
        Ok(if ttl > 0 { ttl as u64 } else { window_secs as u64 })
    }
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

fn reset_timestamp(in_secs: u64) -> Timestamp {
    Timestamp::now().plus_secs(in_secs)
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let redis_key = key.to_redis_key();
        let (limit, window_secs) = self.config.limits_for(&key);
        let mut conn = self.conn.clone();

        let count: i64 = conn.incr(&redis_key, 1_i64).await.map_err(unavailable)?;
        if count == 1 {
            conn.expire::<_, ()>(&redis_key, window_secs.max(1) as i64)
                .await
                .map_err(unavailable)?;
        }
        let reset_secs = Self::ttl_secs(&mut conn, &redis_key, window_secs).await?;

        if count > limit as i64 {
            let retry_after = (reset_secs as u32).max(1);
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit,
                retry_after_secs: retry_after,
                scope: key.scope,
                message: format!(
                    "Too many requests. Please try again in {} seconds.",
                    retry_after
                ),
            }));
        }

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count as u32),
            reset_at: reset_timestamp(reset_secs),
            window_secs,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let redis_key = key.to_redis_key();
        let (limit, window_secs) = self.config.limits_for(&key);
        let mut conn = self.conn.clone();

        let count: Option<i64> = conn.get(&redis_key).await.map_err(unavailable)?;
        let count = count.unwrap_or(0).max(0) as u32;
        let reset_secs = Self::ttl_secs(&mut conn, &redis_key, window_secs).await?;

        Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: reset_timestamp(reset_secs),
            window_secs,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key.to_redis_key())
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
