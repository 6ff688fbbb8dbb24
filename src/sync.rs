//! Thread-safe wrapper for sharing one cache between threads.
//!
//! The store connection can move between threads but not be used from two at
//! once, so every call takes an exclusive lock.
//!
//! ```toml
//! [dependencies]
//! geoh = { version = "0.1", features = ["sync"] }
//! ```
//!
//! ```rust
//! use geoh::SyncCache;
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = SyncCache::memory()?;
//! let writer = cache.clone();
//!
//! thread::spawn(move || writer.add(13.4050, 52.5200, "city", b"Berlin").unwrap())
//!     .join()
//!     .unwrap();
//!
//! assert_eq!(cache.get_nearby(13.4050, 52.5200, Some("city"))?.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::cache::{Closest, Nearby, PointRecord, SpatialCache};
use crate::config::CacheConfig;
use crate::error::Result;
use geoh_types::stats::CacheStats;
use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::sync::Arc;

/// Thread-safe handle to a [`SpatialCache`] using `Arc<Mutex<_>>`.
///
/// Clones share the same cache. Closing through any clone closes it for all.
#[derive(Clone)]
pub struct SyncCache {
    inner: Arc<Mutex<SpatialCache>>,
}

impl SyncCache {
    pub fn new(cache: SpatialCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn memory() -> Result<Self> {
        Ok(Self::new(SpatialCache::memory()?))
    }

    pub fn memory_with_config(config: CacheConfig) -> Result<Self> {
        Ok(Self::new(SpatialCache::memory_with_config(config)?))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(SpatialCache::open(path)?))
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: CacheConfig) -> Result<Self> {
        Ok(Self::new(SpatialCache::open_with_config(path, config)?))
    }

    pub fn add(&self, lon: f64, lat: f64, category: &str, payload: impl AsRef<[u8]>) -> Result<()> {
        self.inner.lock().add(lon, lat, category, payload)
    }

    pub fn add_many<I, R>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = R>,
        R: Into<PointRecord>,
    {
        self.inner.lock().add_many(records)
    }

    pub fn guess_density(&self, lon: f64, lat: f64, category: Option<&str>) -> Result<u64> {
        self.inner.lock().guess_density(lon, lat, category)
    }

    pub fn get_nearby(&self, lon: f64, lat: f64, category: Option<&str>) -> Result<Vec<Nearby>> {
        self.inner.lock().get_nearby(lon, lat, category)
    }

    pub fn get_closest(&self, lon: f64, lat: f64, category: Option<&str>) -> Result<Option<Closest>> {
        self.inner.lock().get_closest(lon, lat, category)
    }

    pub fn categories(&self) -> Result<Vec<String>> {
        self.inner.lock().categories()
    }

    pub fn stats(&self) -> Result<CacheStats> {
        self.inner.lock().stats()
    }

    pub fn save(&self) -> Result<()> {
        self.inner.lock().save()
    }

    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    /// Hold the lock across several calls.
    pub fn lock(&self) -> MutexGuard<'_, SpatialCache> {
        self.inner.lock()
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<SyncCache>;
};
