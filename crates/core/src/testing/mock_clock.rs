//! Manually driven clock for testing.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::Clock;

/// Virtual time. `sleep` returns at once after moving the clock forward by
/// the requested amount, and remembers what was asked for.
#[derive(Debug)]
pub struct MockClock {
    now_ms: AtomicI64,
    sleeps: Arc<RwLock<Vec<std::time::Duration>>>,
}

impl Default for MockClock {
    /// Starts at 2026-03-01 12:00 UTC.
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap_or_default())
    }
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: AtomicI64::new(start.timestamp_millis()),
            sleeps: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now_ms.store(now.timestamp_millis(), Ordering::SeqCst);
    }

    /// Requested sleeps, in order.
    pub async fn sleeps(&self) -> Vec<std::time::Duration> {
        self.sleeps.read().await.clone()
    }

    pub async fn total_slept(&self) -> std::time::Duration {
        self.sleeps.read().await.iter().sum()
    }
}

#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst)).unwrap_or_default()
    }

    async fn sleep(&self, duration: std::time::Duration) {
        self.sleeps.write().await.push(duration);
        self.now_ms
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
        // let other tasks run, as a real sleep would
        tokio::task::yield_now().await;
    }
}
