//! Cache store access and statistics.

pub mod fs;
pub mod monitor;

pub use fs::FsCacheStore;
pub use monitor::{CacheMonitor, CacheMonitorHandle, DEFAULT_POLL_INTERVAL};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// Read-only queries over a persistent cache store owned by the runtime.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Current cache size (bytes or entry count, store-defined)
    async fn cache_size(&self) -> Result<u64>;

    /// Share of the storage quota in use, 0 to 100
    async fn usage_percent(&self) -> Result<f64>;
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: u64,
    pub usage_percent: f64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    /// When the stats were last recomputed; `None` before the first poll
    pub updated_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// Combine a poll result with the current hit/miss totals.
    pub fn compute(size: u64, usage_percent: f64, counters: &HitCounters) -> Self {
        let (hit_rate, miss_rate) = counters.rates();
        Self {
            size,
            usage_percent: clamp_percent(usage_percent),
            hit_rate,
            miss_rate,
            updated_at: Some(Utc::now()),
        }
    }
}

/// Clamp a percentage to `[0, 100]`; non-finite input counts as 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Cumulative hit/miss counters for one monitoring session.
///
/// Cloning shares the underlying counters.
#[derive(Debug, Clone, Default)]
pub struct HitCounters {
    inner: Arc<Counts>,
}

#[derive(Debug, Default)]
struct Counts {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.inner.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.inner.misses.load(Ordering::Relaxed)
    }

    /// Whole-percent hit and miss rates. They sum to exactly 100 once
    /// anything was recorded, and are both 0 before that.
    pub fn rates(&self) -> (f64, f64) {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            return (0.0, 0.0);
        }
        let hit_rate = ((hits as f64 / total as f64) * 100.0).round();
        (hit_rate, 100.0 - hit_rate)
    }
}
