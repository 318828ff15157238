//! Path resolution caching.
//!
//! [`ResolveCache`] remembers which route key and parameters a relative path
//! resolved to, so repeated link clicks and history moves skip the matcher.
//! It is gated behind the `cache` feature and uses the [`lru`] crate.
//!
//! Misses are cached too (as `None`), because unknown paths from stale links
//! tend to be clicked repeatedly.
//!
//! ```
//! use villa_navigator::cache::ResolveCache;
//! use villa_navigator::RouteParams;
//!
//! let mut cache = ResolveCache::new();
//! cache.insert("/dashboard".to_string(), Some(("dashboard".to_string(), RouteParams::new())));
//!
//! assert_eq!(cache.get("/dashboard").unwrap().unwrap().0, "dashboard");
//! assert_eq!(cache.stats().hits, 1);
//! ```

use crate::{debug_log, trace_log, RouteParams};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cached resolution: the route key and captured params, or `None` for a
/// path that matched nothing.
pub type Resolution = Option<(String, RouteParams)>;

/// Lookup counters since creation or the last [`ResolveCache::reset_stats`].
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: usize,
    /// Number of lookups that had to run the matcher.
    pub misses: usize,
    /// Number of full cache invalidations (via [`ResolveCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Share of lookups answered from the cache; `0.0` before any lookup.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of path resolutions. Default capacity is 256 entries.
#[derive(Debug)]
pub struct ResolveCache {
    entries: LruCache<String, Resolution>,
    stats: CacheStats,
}

impl ResolveCache {
    /// Default number of cached paths.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache with a custom capacity. Zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    /// Look up a path. The outer `Option` is the cache hit, the inner one the
    /// resolution itself.
    pub fn get(&mut self, path: &str) -> Option<Resolution> {
        if let Some(entry) = self.entries.get(path) {
            self.stats.hits += 1;
            trace_log!("Resolve cache hit for path: '{}'", path);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Resolve cache miss for path: '{}'", path);
            None
        }
    }

    /// Remember a resolution.
    pub fn insert(&mut self, path: String, resolution: Resolution) {
        self.entries.push(path, resolution);
    }

    /// Drop every entry and increment the invalidation counter.
    pub fn clear(&mut self) {
        let len = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Resolve cache cleared: {} entries removed ({} total invalidations, hit rate: {:.1}%)",
            len,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Hit, miss and eviction counters.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Zero the counters, keeping the entries.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Number of cached resolutions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached resolutions.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for ResolveCache {
    fn default() -> Self {
        Self::new()
    }
}
