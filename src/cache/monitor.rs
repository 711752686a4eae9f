//! Background task that periodically polls the cache store

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{CacheStats, CacheStore, HitCounters};
use crate::error::Result;
use crate::liveness::LiveState;

/// Default poll interval (5 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Polls a [`CacheStore`] and publishes [`CacheStats`].
pub struct CacheMonitor {
    store: Arc<dyn CacheStore>,
    interval: Duration,
}

impl CacheMonitor {
    pub fn new(store: Arc<dyn CacheStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub fn with_default_interval(store: Arc<dyn CacheStore>) -> Self {
        Self::new(store, DEFAULT_POLL_INTERVAL)
    }

    /// Start polling: once immediately, then on every interval tick. Must be
    /// called from within a tokio runtime.
    pub fn start(self) -> CacheMonitorHandle {
        let shared = Arc::new(Shared {
            store: self.store,
            counters: HitCounters::new(),
            state: LiveState::new(CacheStats::default()),
        });

        let task = Arc::clone(&shared);
        let token = shared.state.scope().clone();
        let interval = self.interval;
        tokio::spawn(async move {
            info!("Starting cache monitor with interval: {:?}", interval);

            // A zero period would panic inside tokio::time::interval.
            let mut ticker = time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Cache monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        task.poll_once().await;
                    }
                }
            }
        });

        CacheMonitorHandle { shared }
    }
}

struct Shared {
    store: Arc<dyn CacheStore>,
    counters: HitCounters,
    state: LiveState<CacheStats>,
}

impl Shared {
    async fn query(&self) -> Result<(u64, f64)> {
        let size = self.store.cache_size().await?;
        let usage = self.store.usage_percent().await?;
        Ok((size, usage))
    }

    /// Poll the store once. A failed query keeps the last good stats.
    async fn poll_once(&self) -> Option<CacheStats> {
        match self.query().await {
            Ok((size, usage)) => {
                let stats = CacheStats::compute(size, usage, &self.counters);
                let published = self.state.update(|current| *current = stats.clone());
                if published {
                    debug!(
                        size = stats.size,
                        usage_percent = stats.usage_percent,
                        hit_rate = stats.hit_rate,
                        miss_rate = stats.miss_rate,
                        "Cache stats refreshed"
                    );
                    Some(stats)
                } else {
                    None
                }
            }
            Err(e) => {
                warn!("Cache poll failed, keeping last stats: {}", e);
                None
            }
        }
    }
}

/// Owner of a running monitor. Dropping it stops polling.
pub struct CacheMonitorHandle {
    shared: Arc<Shared>,
}

impl CacheMonitorHandle {
    pub fn stats(&self) -> CacheStats {
        self.shared.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheStats> {
        self.shared.state.subscribe()
    }

    /// Counters shared with the monitor; clone freely.
    pub fn counters(&self) -> HitCounters {
        self.shared.counters.clone()
    }

    pub fn record_hit(&self) {
        self.shared.counters.record_hit();
    }

    pub fn record_miss(&self) {
        self.shared.counters.record_miss();
    }

    /// Poll out of band. Returns `None` if the query failed or the monitor
    /// was stopped.
    pub async fn refresh(&self) -> Option<CacheStats> {
        if !self.shared.state.is_live() {
            return None;
        }
        self.shared.poll_once().await
    }

    /// Token cancelled when the monitor stops.
    pub fn stopped(&self) -> CancellationToken {
        self.shared.state.scope().clone()
    }

    pub fn stop(&self) {
        self.shared.state.teardown();
    }
}

impl Drop for CacheMonitorHandle {
    fn drop(&mut self) {
        self.shared.state.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct FlakyStore {
        fail: AtomicBool,
        polls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl CacheStore for FlakyStore {
        async fn cache_size(&self) -> Result<u64> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::CacheQuery("quota api unavailable".into()));
            }
            Ok(u64::from(n) * 10)
        }

        async fn usage_percent(&self) -> Result<f64> {
            Ok(12.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_keeps_last_stats() {
        let store = Arc::new(FlakyStore {
            fail: AtomicBool::new(false),
            polls: AtomicU32::new(0),
        });
        let handle = CacheMonitor::new(store.clone(), Duration::from_secs(1)).start();

        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.updated_at.is_some()).await.unwrap();
        assert_eq!(handle.stats().size, 10);

        store.fail.store(true, Ordering::SeqCst);
        time::sleep(Duration::from_millis(3500)).await;
        assert!(store.polls.load(Ordering::SeqCst) >= 3);
        assert_eq!(handle.stats().size, 10);

        store.fail.store(false, Ordering::SeqCst);
        time::sleep(Duration::from_secs(1)).await;
        assert!(handle.stats().size > 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_stop_is_none() {
        let store = Arc::new(FlakyStore {
            fail: AtomicBool::new(false),
            polls: AtomicU32::new(0),
        });
        let handle = CacheMonitor::with_default_interval(store).start();
        assert!(handle.refresh().await.is_some());
        handle.stop();
        assert!(handle.refresh().await.is_none());
        assert!(handle.stopped().is_cancelled());
    }
}
