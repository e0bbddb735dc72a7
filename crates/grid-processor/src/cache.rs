//! LRU cache of resampler weights.
//!
//! Sources whose coordinates never change between time steps (the
//! reanalysis grid, the daily concentration grid) triangulate once per run
//! and reuse the weights for every later query.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lru::LruCache;
use seaice_common::TargetGrid;
use tracing::debug;

use crate::config::ResamplerConfig;
use crate::error::Result;
use crate::resample::{source_fingerprint, ScatteredResampler};

/// Cache key: (source coordinate fingerprint, target grid fingerprint).
pub type ResamplerKey = (u64, u64);

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU cache handing out shared resamplers.
pub struct ResamplerCache {
    cache: Mutex<LruCache<ResamplerKey, Arc<ScatteredResampler>>>,
    parallel: bool,
    points_per_bucket: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResamplerCache {
    /// Create a cache holding at most `capacity` weight sets.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(&ResamplerConfig {
            cache_capacity: capacity,
            ..ResamplerConfig::default()
        })
    }

    pub fn with_config(config: &ResamplerConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            parallel: config.parallel,
            points_per_bucket: config.points_per_bucket,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return cached weights for this source/grid pair, building them on a
    /// miss.
    ///
    /// The lock is not held while triangulating, so two threads missing on
    /// the same key may both build; the second insert wins.
    pub fn get_or_build(
        &self,
        src_x: &[f64],
        src_y: &[f64],
        grid: &TargetGrid,
    ) -> Result<Arc<ScatteredResampler>> {
        let key = (source_fingerprint(src_x, src_y), grid.fingerprint());

        if let Some(hit) = self.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(hit));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let resampler = Arc::new(ScatteredResampler::build(
            src_x,
            src_y,
            grid,
            self.parallel,
            self.points_per_bucket,
        )?);
        debug!(source = key.0, grid = key.1, "Cached new resampler weights");
        self.lock().put(key, Arc::clone(&resampler));
        Ok(resampler)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<ResamplerKey, Arc<ScatteredResampler>>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still consistent.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ResamplerCache {
    fn default() -> Self {
        Self::with_config(&ResamplerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seaice_common::CrsCode;

    fn triangle() -> (Vec<f64>, Vec<f64>) {
        (vec![0.0, 10.0, 0.0], vec![0.0, 0.0, 10.0])
    }

    #[test]
    fn test_hit_after_miss() {
        let cache = ResamplerCache::new(4);
        let (xs, ys) = triangle();
        let grid = TargetGrid::from_axes(&[1.0, 2.0], &[1.0], CrsCode::Epsg3408);

        let first = cache.get_or_build(&xs, &ys, &grid).unwrap();
        let second = cache.get_or_build(&xs, &ys, &grid).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = ResamplerCache::new(1);
        let (xs, ys) = triangle();
        let a = TargetGrid::from_axes(&[1.0], &[1.0], CrsCode::Epsg3408);
        let b = TargetGrid::from_axes(&[2.0], &[1.0], CrsCode::Epsg3408);

        cache.get_or_build(&xs, &ys, &a).unwrap();
        cache.get_or_build(&xs, &ys, &b).unwrap();
        cache.get_or_build(&xs, &ys, &a).unwrap();
        assert_eq!(cache.stats().misses, 3);
        assert_eq!(cache.stats().entries, 1);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}
