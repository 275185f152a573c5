//! Volume cache integration tests.
//!
//! Tests verify:
//! - The cache never holds more volumes than its capacity
//! - Eviction follows insertion order, not access order
//! - Concurrent requests for one scan trigger a single load
//! - Different scans load independently

use std::sync::Arc;
use std::time::{Duration, Instant};

use ct_slicer::VolumeCache;

use super::test_utils::CountingLoader;

#[tokio::test]
async fn test_three_scans_capacity_two() {
    let cache = VolumeCache::with_capacity(CountingLoader::new(), 2);

    cache.get_or_load("scan-1").await.unwrap();
    cache.get_or_load("scan-2").await.unwrap();
    cache.get_or_load("scan-3").await.unwrap();

    assert_eq!(cache.cached_count().await, 2);
    assert!(!cache.contains("scan-1").await);
    assert!(cache.contains("scan-2").await);
    assert!(cache.contains("scan-3").await);

    // Evicted volume is decoded again on demand
    cache.get_or_load("scan-1").await.unwrap();
    assert_eq!(cache.loader().calls(), 4);
    assert!(!cache.contains("scan-2").await);
}

#[tokio::test]
async fn test_hits_do_not_reorder_eviction() {
    let cache = VolumeCache::with_capacity(CountingLoader::new(), 2);

    cache.get_or_load("scan-1").await.unwrap();
    cache.get_or_load("scan-2").await.unwrap();
    for _ in 0..5 {
        cache.get_or_load("scan-1").await.unwrap();
    }
    cache.get_or_load("scan-3").await.unwrap();

    // scan-1 was inserted first, so it goes first despite the recent hits
    assert!(!cache.contains("scan-1").await);
    assert!(cache.contains("scan-2").await);
    assert_eq!(cache.loader().calls(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_load() {
    let cache = Arc::new(VolumeCache::new(CountingLoader::with_delay(
        Duration::from_millis(100),
    )));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(
            async move { cache.get_or_load("scan-1").await },
        ));
    }

    let mut volumes = Vec::new();
    for handle in handles {
        volumes.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(cache.loader().calls(), 1);
    for volume in &volumes[1..] {
        assert!(Arc::ptr_eq(&volumes[0], volume));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_scans_load_in_parallel() {
    let cache = Arc::new(VolumeCache::with_capacity(
        CountingLoader::with_delay(Duration::from_millis(200)),
        4,
    ));

    let start = Instant::now();
    let mut handles = Vec::new();
    for id in ["scan-1", "scan-2", "scan-3"] {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.get_or_load(id).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(cache.loader().calls(), 3);
    // Serialized loads would take at least 600ms
    assert!(start.elapsed() < Duration::from_millis(550));
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let cache = VolumeCache::new(CountingLoader::new());

    let err = cache.get_or_load("missing-scan").await.unwrap_err();
    assert_eq!(err.error_code(), "not_found");
    assert_eq!(cache.cached_count().await, 0);

    assert!(cache.get_or_load("missing-scan").await.is_err());
    assert_eq!(cache.loader().calls(), 2);
}
