//! Caller-owned, time-bounded catalog cache.
//!
//! Holds at most one built [`CatalogIndex`] keyed by its source. There is no
//! process-wide instance; whoever wants reuse across runs keeps one of these.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::CatalogIndex;
use crate::error::VolumeError;

#[derive(Debug)]
struct CachedCatalog {
    key: String,
    loaded_at: Instant,
    index: Arc<CatalogIndex>,
}

#[derive(Debug)]
pub struct CatalogCache {
    ttl: Duration,
    slot: Option<CachedCatalog>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached index for `key`, or the result of `load` when missing or stale.
    ///
    /// A failed load leaves the previous entry untouched.
    pub fn get_or_load<F>(&mut self, key: &str, load: F) -> Result<Arc<CatalogIndex>, VolumeError>
    where
        F: FnOnce() -> Result<CatalogIndex, VolumeError>,
    {
        self.get_or_load_at(key, Instant::now(), load)
    }

    fn get_or_load_at<F>(
        &mut self,
        key: &str,
        now: Instant,
        load: F,
    ) -> Result<Arc<CatalogIndex>, VolumeError>
    where
        F: FnOnce() -> Result<CatalogIndex, VolumeError>,
    {
        if let Some(cached) = &self.slot {
            if cached.key == key && now.saturating_duration_since(cached.loaded_at) < self.ttl {
                log::debug!("catalog cache hit: {key}");
                return Ok(Arc::clone(&cached.index));
            }
        }

        log::debug!("catalog cache miss: {key}");
        let index = Arc::new(load()?);
        self.slot = Some(CachedCatalog {
            key: key.to_string(),
            loaded_at: now,
            index: Arc::clone(&index),
        });
        Ok(index)
    }

    /// Whether a fresh entry for `key` is held right now.
    pub fn is_fresh(&self, key: &str) -> bool {
        self.slot.as_ref().is_some_and(|c| {
            c.key == key && Instant::now().saturating_duration_since(c.loaded_at) < self.ttl
        })
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
