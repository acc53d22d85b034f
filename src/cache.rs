// Catalog slice cache: keeps fetched slices warm so tier and hotel switches
// do not re-fetch identical reference data from the supplier layer

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::catalog::{CatalogKind, CatalogSlice};

// Internal counters, updated lock-free
#[derive(Debug, Default)]
pub struct CacheStats {
    pub items_count: AtomicUsize,
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub expired_count: AtomicUsize,
    pub invalidated_count: AtomicUsize,
}

// Point-in-time snapshot of the counters
#[derive(Debug, Default, Clone)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub invalidated_count: usize,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 300,
        }
    }
}

struct CacheEntry {
    slice: CatalogSlice,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

// Key is the slice kind plus the filter that produced it
fn cache_key(kind: CatalogKind, filter_keys: &[String]) -> String {
    format!("{}:{}", kind.as_str(), filter_keys.join(","))
}

pub struct CatalogCache {
    entries: DashMap<String, CacheEntry>,
    config: CacheConfig,
    stats: CacheStats,
}

impl CatalogCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            stats: CacheStats::default(),
        }
    }

    // Store a fetched slice. None uses the configured default TTL.
    pub fn store(
        &self,
        kind: CatalogKind,
        filter_keys: &[String],
        slice: CatalogSlice,
        ttl: Option<Duration>,
    ) {
        let key = cache_key(kind, filter_keys);
        let entry = CacheEntry {
            slice,
            created_at: Instant::now(),
            ttl: ttl.unwrap_or_else(|| Duration::from_secs(self.config.default_ttl_seconds)),
        };
        if self.entries.insert(key, entry).is_none() {
            self.stats.items_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    // Fresh slice for this kind and filter, if one is cached. Expired entries
    // are dropped on access.
    pub fn get(&self, kind: CatalogKind, filter_keys: &[String]) -> Option<CatalogSlice> {
        let key = cache_key(kind, filter_keys);

        let expired = match self.entries.get(&key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                return Some(entry.slice.clone());
            }
            None => {
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                return None;
            }
        };

        if expired {
            self.entries.remove(&key);
            self.stats.items_count.fetch_sub(1, Ordering::SeqCst);
            self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
            self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
        }
        None
    }

    // Drop every cached slice of one kind, e.g. after a supplier pushes fresh
    // availability. Returns the number of entries removed.
    pub fn invalidate_kind(&self, kind: CatalogKind) -> usize {
        let prefix = format!("{}:", kind.as_str());
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        self.stats.items_count.fetch_sub(removed, Ordering::SeqCst);
        self.stats
            .invalidated_count
            .fetch_add(removed, Ordering::SeqCst);
        removed
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.stats.items_count.load(Ordering::SeqCst),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
            invalidated_count: self.stats.invalidated_count.load(Ordering::SeqCst),
        }
    }
}
