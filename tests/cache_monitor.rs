mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::StaticCacheStore;
use vagas_pwa_core::cache::{CacheMonitor, FsCacheStore};

#[tokio::test(start_paused = true)]
async fn test_first_tick_reports_store_values() {
    let store = StaticCacheStore::new(42, 73.0);
    let handle = CacheMonitor::new(store.clone(), Duration::from_secs(5)).start();

    let mut rx = handle.subscribe();
    let stats = rx.wait_for(|s| s.updated_at.is_some()).await.unwrap().clone();
    assert_eq!(stats.size, 42);
    assert_eq!(stats.usage_percent, 73.0);
    assert_eq!(stats.hit_rate, 0.0);
    assert_eq!(stats.miss_rate, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_polls_on_every_interval() {
    let store = StaticCacheStore::new(1, 1.0);
    let handle = CacheMonitor::new(store.clone(), Duration::from_millis(500)).start();

    tokio::time::sleep(Duration::from_millis(1250)).await;
    // Immediate poll plus ticks at 500ms and 1000ms.
    assert_eq!(store.queries.load(Ordering::SeqCst), 3);

    store.set(2048, 12.5);
    tokio::time::sleep(Duration::from_millis(500)).await;
    let stats = handle.stats();
    assert_eq!(stats.size, 2048);
    assert_eq!(stats.usage_percent, 12.5);
}

#[tokio::test(start_paused = true)]
async fn test_hit_miss_rates_use_cumulative_counters() {
    let store = StaticCacheStore::new(10, 5.0);
    let handle = CacheMonitor::new(store, Duration::from_secs(1)).start();

    let counters = handle.counters();
    for _ in 0..3 {
        counters.record_hit();
    }
    handle.record_miss();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let stats = handle.stats();
    assert_eq!(stats.hit_rate, 75.0);
    assert_eq!(stats.miss_rate, 25.0);
    assert_eq!(stats.hit_rate + stats.miss_rate, 100.0);

    handle.record_miss();
    let stats = handle.refresh().await.unwrap();
    assert_eq!(stats.hit_rate, 60.0);
    assert_eq!(stats.miss_rate, 40.0);
}

#[tokio::test(start_paused = true)]
async fn test_query_failure_keeps_polling() {
    let store = StaticCacheStore::new(42, 73.0);
    let handle = CacheMonitor::new(store.clone(), Duration::from_secs(1)).start();

    let mut rx = handle.subscribe();
    rx.wait_for(|s| s.updated_at.is_some()).await.unwrap();

    store.fail.store(true, Ordering::SeqCst);
    store.set(99, 99.0);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(handle.stats().size, 42);
    assert!(handle.refresh().await.is_none());

    store.fail.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handle.stats().size, 99);
}

#[tokio::test(start_paused = true)]
async fn test_no_polls_after_stop() {
    let store = StaticCacheStore::new(1, 1.0);
    let handle = CacheMonitor::new(store.clone(), Duration::from_secs(1)).start();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.stop();
    let frozen = handle.stats();
    let queries = store.queries.load(Ordering::SeqCst);

    store.set(500, 50.0);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.queries.load(Ordering::SeqCst), queries);
    assert_eq!(handle.stats(), frozen);
}

#[tokio::test(start_paused = true)]
async fn test_new_session_starts_counters_from_zero() {
    let store = StaticCacheStore::new(1, 1.0);
    let first = CacheMonitor::new(store.clone(), Duration::from_secs(1)).start();
    first.record_hit();
    drop(first);

    let second = CacheMonitor::new(store, Duration::from_secs(1)).start();
    assert_eq!(second.counters().hits(), 0);
    let stats = second.refresh().await.unwrap();
    assert_eq!(stats.hit_rate, 0.0);
}

#[tokio::test]
async fn test_monitor_over_directory_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("offline.html"), vec![b'x'; 512]).unwrap();

    let store = Arc::new(FsCacheStore::new(dir.path(), 2048));
    let handle = CacheMonitor::new(store, Duration::from_secs(60)).start();

    let stats = handle.refresh().await.unwrap();
    assert_eq!(stats.size, 512);
    assert_eq!(stats.usage_percent, 25.0);
}
