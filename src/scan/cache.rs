//! Bounded volume cache with singleflight loading.
//!
//! Decoded CT volumes are large (hundreds of MB for a chest scan), so the
//! cache holds only a handful of them. Concurrent requests for a scan that
//! is not cached share one load instead of decoding the file several times.
//!
//! Eviction is by insertion order: a cache hit does not refresh an entry's
//! position, so the oldest loaded volume is always the next one dropped.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info};

use crate::error::VolumeError;
use crate::volume::Volume;

use super::loader::VolumeLoader;

// =============================================================================
// Configuration
// =============================================================================

/// Default number of decoded volumes kept in memory.
pub const DEFAULT_VOLUME_CACHE_CAPACITY: usize = 2;

type LoadResult = Result<Arc<Volume>, VolumeError>;

/// A load shared by every request that arrives while it runs.
struct InFlightLoad {
    result: OnceCell<LoadResult>,
}

// =============================================================================
// VolumeCache
// =============================================================================

/// Cache of decoded volumes keyed by scan id.
///
/// Failed loads are never stored; the next request retries.
pub struct VolumeCache<L: VolumeLoader> {
    loader: L,

    /// Loaded volumes, oldest insertion first
    cache: RwLock<LruCache<String, Arc<Volume>>>,

    /// Loads currently running, one per scan id
    in_flight: Mutex<HashMap<String, Arc<InFlightLoad>>>,
}

impl<L: VolumeLoader> VolumeCache<L> {
    pub fn new(loader: L) -> Self {
        Self::with_capacity(loader, DEFAULT_VOLUME_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` volumes (minimum 1).
    pub fn with_capacity(loader: L, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            loader,
            cache: RwLock::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Return the cached volume for `scan_id`, loading it on a miss.
    pub async fn get_or_load(&self, scan_id: &str) -> LoadResult {
        if let Some(volume) = self.peek(scan_id).await {
            debug!(scan_id, "Volume cache hit");
            return Ok(volume);
        }

        let state = {
            let mut in_flight = self.in_flight.lock().await;

            // A load may have finished between the check above and taking the lock.
            if let Some(volume) = self.peek(scan_id).await {
                return Ok(volume);
            }

            in_flight
                .entry(scan_id.to_string())
                .or_insert_with(|| {
                    Arc::new(InFlightLoad {
                        result: OnceCell::new(),
                    })
                })
                .clone()
        };

        let result = state
            .result
            .get_or_init(|| self.load_and_insert(scan_id))
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(scan_id)
                .map(|current| Arc::ptr_eq(current, &state))
                .unwrap_or(false)
            {
                in_flight.remove(scan_id);
            }
        }

        result
    }

    async fn load_and_insert(&self, scan_id: &str) -> LoadResult {
        let volume = Arc::new(self.loader.load(scan_id).await?);

        let mut cache = self.cache.write().await;
        if !cache.contains(scan_id) && cache.len() == cache.cap().get() {
            if let Some((evicted, _)) = cache.pop_lru() {
                info!(evicted = %evicted, "Evicted volume from cache");
            }
        }
        cache.put(scan_id.to_string(), volume.clone());

        Ok(volume)
    }

    async fn peek(&self, scan_id: &str) -> Option<Arc<Volume>> {
        let cache = self.cache.read().await;
        cache.peek(scan_id).cloned()
    }

    /// Whether `scan_id` is currently cached.
    pub async fn contains(&self, scan_id: &str) -> bool {
        self.cache.read().await.contains(scan_id)
    }

    /// Drop one volume from the cache.
    pub async fn invalidate(&self, scan_id: &str) {
        let mut cache = self.cache.write().await;
        cache.pop(scan_id);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    pub async fn cached_count(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }

    pub async fn capacity(&self) -> usize {
        self.cache.read().await.cap().get()
    }
}

// =============================================================================
// Tests
// =============================================================================
