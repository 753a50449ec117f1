use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::Clock;
use crate::error::{AppError, AppResult, StoreError};
use crate::stats::SeriesPoint;

use super::store::KvStore;

/// How long a point stays in a persisted series.
pub const SERIES_RETENTION: Duration = Duration::from_secs(15 * 60);
/// Latency history (percentile lines).
pub const LATENCY_SERIES_KEY: &str = "chartData";
/// Throughput and failure-ratio history.
pub const THROUGHPUT_SERIES_KEY: &str = "tpsline";
pub const SERIES_KEYS: [&str; 2] = [LATENCY_SERIES_KEY, THROUGHPUT_SERIES_KEY];

/// Retention-windowed series persisted through a [`KvStore`].
///
/// Nothing is cached in memory: every operation reads and rewrites the
/// stored JSON array. Operations on the same key are serialized.
pub struct SeriesBuffer<S, C> {
    store: S,
    clock: C,
    retention: Duration,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S, C> SeriesBuffer<S, C>
where
    S: KvStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self::with_retention(store, clock, SERIES_RETENTION)
    }

    pub fn with_retention(store: S, clock: C, retention: Duration) -> Self {
        Self {
            store,
            clock,
            retention,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(key.to_owned()).or_default())
    }

    /// Evicts expired points, then appends `points` that do not go back in
    /// time relative to the stored tail.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored series cannot be read, decoded or
    /// written back.
    pub async fn append(&self, key: &str, points: Vec<SeriesPoint>) -> AppResult<()> {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        let mut series = self.load(key).await?;
        let retention = TimeDelta::from_std(self.retention).unwrap_or(TimeDelta::MAX);
        let now = self.clock.now();
        if let Some(cutoff) = now.checked_sub_signed(retention) {
            let expired = series
                .iter()
                .take_while(|point| point.timestamp < cutoff)
                .count();
            if expired > 0 {
                debug!("Evicting {} expired points from {}", expired, key);
                series.drain(..expired);
            }
        }

        let mut tail = series.last().map(|point| point.timestamp);
        for point in points {
            if tail.is_some_and(|last| point.timestamp < last) {
                debug!(
                    "Dropping out-of-order point {} for {}",
                    point.category, key
                );
                continue;
            }
            tail = Some(point.timestamp);
            series.push(point);
        }

        self.save(key, &series).await
    }

    /// # Errors
    ///
    /// Returns an error when the stored series cannot be read or decoded.
    pub async fn read(&self, key: &str) -> AppResult<Vec<SeriesPoint>> {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;
        self.load(key).await
    }

    /// # Errors
    ///
    /// Returns an error when the store rejects the removal.
    pub async fn clear(&self, key: &str) -> AppResult<()> {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;
        self.store.remove(key).await
    }

    /// Clears both well-known series.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn clear_all(&self) -> AppResult<()> {
        for key in SERIES_KEYS {
            self.clear(key).await?;
        }
        Ok(())
    }

    async fn load(&self, key: &str) -> AppResult<Vec<SeriesPoint>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|err| {
            AppError::store(StoreError::Decode {
                key: key.to_owned(),
                source: err,
            })
        })
    }

    async fn save(&self, key: &str, series: &[SeriesPoint]) -> AppResult<()> {
        let raw = serde_json::to_string(series).map_err(|err| {
            AppError::store(StoreError::Encode {
                key: key.to_owned(),
                source: err,
            })
        })?;
        self.store.set(key, raw).await
    }
}
