//! In-memory rate limiter for tests and single-instance deployments.
//!
//! Fixed-window counters in a HashMap. Ended windows are swept out at
//! most once per sweep interval. State is lost on restart and not shared
//! between instances; use the Redis adapter for that.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

/// Seconds between sweeps of ended windows.
const SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<WindowTable>>,
}

#[derive(Debug, Default)]
struct WindowTable {
    entries: HashMap<String, WindowState>,
    last_sweep: u64,
}

impl WindowTable {
    fn sweep(&mut self, now: u64) {
        if now < self.last_sweep + SWEEP_INTERVAL_SECS {
            return;
        }
        self.entries.retain(|_, state| now < state.end());
        self.last_sweep = now;
    }
}

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: u64,
    window_secs: u32,
}

impl WindowState {
    fn end(&self) -> u64 {
        self.window_start + self.window_secs as u64
    }
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(WindowTable::default())),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    fn now_secs() -> u64 {
        Timestamp::now().as_unix_secs()
    }

    async fn check_at(&self, key: RateLimitKey, now: u64) -> RateLimitResult {
        let storage_key = key.to_redis_key();
        let (limit, window_secs) = self.config.limits_for(&key);

        let mut windows = self.windows.write().await;
        windows.sweep(now);
        let state = windows.entries.entry(storage_key).or_insert_with(|| WindowState {
            count: 0,
            window_start: now,
            window_secs,
        });

        if now >= state.end() {
            state.count = 0;
            state.window_start = now;
        }

        if state.count >= limit {
            let retry_after = state.end().saturating_sub(now) as u32;
            return RateLimitResult::Denied(RateLimitDenied {
                limit,
                retry_after_secs: retry_after.max(1),
                scope: key.scope,
                message: format!(
                    "Too many requests. Please try again in {} seconds.",
                    retry_after.max(1)
                ),
            });
        }

        state.count += 1;
        RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_at: reset_timestamp(state.end()),
            window_secs,
        })
    }
}

fn reset_timestamp(secs: u64) -> Timestamp {
    Timestamp::from_unix_secs(secs).unwrap_or_else(Timestamp::now)
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_at(key, Self::now_secs()).await)
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let (limit, window_secs) = self.config.limits_for(&key);
        let now = Self::now_secs();

        let windows = self.windows.read().await;
        let (count, window_start) = windows
            .entries
            .get(&key.to_redis_key())
            .filter(|state| now < state.end())
            .map(|state| (state.count, state.window_start))
            .unwrap_or((0, now));

        Ok(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: reset_timestamp(window_start + window_secs as u64),
            window_secs,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        self.windows.write().await.entries.remove(&key.to_redis_key());
        Ok(())
    }
}
