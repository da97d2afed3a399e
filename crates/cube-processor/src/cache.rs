//! Shared cache of open cubes.
//!
//! Each locator maps to a `OnceCell` so concurrent first requests for the
//! same cube wait on a single open. Entries are evicted least recently used
//! once the configured capacity is reached.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cube_catalog::StorageLocator;
use lru::LruCache;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use velocity_common::EpsgCode;

use crate::cube::VelocityCube;
use crate::error::{CubeError, Result};
use crate::opener::CubeOpener;

type CubeCell = Arc<OnceCell<Arc<dyn VelocityCube>>>;

/// Cube cache statistics.
///
/// `misses` counts lookups that started a new open; callers joining an open
/// already in flight count as neither a hit nor a miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CubeCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub opens: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Cache of open cube handles keyed by storage locator.
pub struct CubeCache {
    opener: Arc<dyn CubeOpener>,
    entries: Mutex<LruCache<String, CubeCell>>,
    open_timeout: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    opens: AtomicU64,
    evictions: AtomicU64,
}

impl CubeCache {
    /// Create a cache holding at most `capacity` cubes; zero means unbounded.
    pub fn new(opener: Arc<dyn CubeOpener>, capacity: usize, open_timeout: Duration) -> Self {
        let entries = match NonZeroUsize::new(capacity) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };

        Self {
            opener,
            entries: Mutex::new(entries),
            open_timeout,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            opens: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the open cube for `locator`, opening it on first use.
    ///
    /// A failed or timed out open leaves no entry behind.
    pub async fn get_or_open(
        &self,
        locator: &StorageLocator,
        epsg: EpsgCode,
    ) -> Result<Arc<dyn VelocityCube>> {
        let key = locator.to_string();

        let cell = {
            let mut entries = self.entries.lock().await;
            match entries.get(&key) {
                Some(cell) => {
                    if let Some(cube) = cell.get() {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Ok(cube.clone());
                    }
                    cell.clone()
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    let cell: CubeCell = Arc::new(OnceCell::new());
                    if let Some((evicted, _)) = entries.push(key.clone(), cell.clone()) {
                        self.evictions.fetch_add(1, Ordering::Relaxed);
                        debug!(cube = %evicted, "Evicted cube from cache");
                    }
                    cell
                }
            }
        };

        let opened = cell
            .get_or_try_init(|| async {
                self.opens.fetch_add(1, Ordering::Relaxed);
                debug!(cube = %key, "Opening cube");
                match tokio::time::timeout(self.open_timeout, self.opener.open(locator, epsg)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(CubeError::Timeout {
                        locator: key.clone(),
                        seconds: self.open_timeout.as_secs(),
                    }),
                }
            })
            .await;

        match opened {
            Ok(cube) => {
                info!(cube = %key, epsg = cube.epsg().code(), "Opened cube");
                Ok(cube.clone())
            }
            Err(e) => {
                warn!(cube = %key, error = %e, "Failed to open cube");
                let mut entries = self.entries.lock().await;
                let stale = entries
                    .peek(&key)
                    .map_or(false, |current| Arc::ptr_eq(current, &cell) && !current.initialized());
                if stale {
                    entries.pop(&key);
                }
                Err(e)
            }
        }
    }

    /// Drop the handle for `locator`. Returns true if it was cached.
    pub async fn release(&self, locator: &StorageLocator) -> bool {
        let released = self.entries.lock().await.pop(&locator.to_string()).is_some();
        if released {
            debug!(cube = %locator, "Released cube");
        }
        released
    }

    /// Drop every cached handle.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn contains(&self, locator: &StorageLocator) -> bool {
        self.entries.lock().await.contains(&locator.to_string())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CubeCacheStats {
        CubeCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            opens: self.opens.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}
