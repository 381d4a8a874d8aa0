//! Caller-owned validation result cache with configurable TTL.
//!
//! Validation is deterministic for a given statement and schema snapshot, so
//! results can be reused until the catalog changes. The guard never owns a
//! cache; callers create one and pass it to
//! [`SqlGuard::validate_cached`](crate::SqlGuard::validate_cached).

use crate::config::CacheConfig;
use crate::security::ValidationResult;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

/// Cache entry containing a validation result and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached result.
    pub result: ValidationResult,

    /// When the entry was created.
    pub created_at: Instant,

    /// Time-to-live for this entry.
    pub ttl: Duration,

    /// Number of times this entry has been accessed.
    pub hit_count: u64,
}

impl CacheEntry {
    pub fn new(result: ValidationResult, ttl: Duration) -> Self {
        Self {
            result,
            created_at: Instant::now(),
            ttl,
            hit_count: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// Cache key: a hash of the statement text plus the schema version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    sql_hash: u64,
    schema_version: Option<String>,
}

impl CacheKey {
    pub fn new(sql: &str, schema_version: Option<&str>) -> Self {
        let mut hasher = DefaultHasher::new();
        sql.hash(&mut hasher);
        Self {
            sql_hash: hasher.finish(),
            schema_version: schema_version.map(str::to_string),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total number of cache hits.
    pub hits: u64,

    /// Total number of cache misses.
    pub misses: u64,

    /// Total number of entries in cache.
    pub entry_count: usize,

    /// Number of evictions.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Validation result cache.
pub struct ValidationCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    default_ttl: Duration,
    max_entries: usize,
    enabled: bool,
    stats: RwLock<CacheStats>,
}

impl ValidationCache {
    pub fn new(default_ttl: Duration, max_entries: usize, enabled: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            max_entries,
            enabled,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl, config.max_entries, config.enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a cached result.
    pub fn get(&self, key: &CacheKey) -> Option<ValidationResult> {
        if !self.enabled {
            return None;
        }

        let mut entries = self.entries.write();

        let hit = match entries.get(key).map(CacheEntry::is_expired) {
            Some(true) => {
                entries.remove(key);
                None
            }
            Some(false) => entries.get_mut(key).map(|entry| {
                entry.hit_count += 1;
                entry.result.clone()
            }),
            None => None,
        };

        let mut stats = self.stats.write();
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        hit
    }

    /// Insert a result into the cache.
    pub fn insert(&self, key: CacheKey, result: ValidationResult) {
        if !self.enabled || self.max_entries == 0 {
            return;
        }

        let mut entries = self.entries.write();

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let evicted = evict_entries(&mut entries, self.max_entries);
            self.stats.write().evictions += evicted as u64;
        }

        entries.insert(key, CacheEntry::new(result, self.default_ttl));
        self.stats.write().entry_count = entries.len();
    }

    /// Clear all entries, e.g. after a catalog refresh.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.stats.write().entry_count = 0;
    }

    /// Drop every entry cached against the given schema version.
    pub fn invalidate_schema(&self, schema_version: &str) {
        let mut entries = self.entries.write();
        entries.retain(|key, _| key.schema_version.as_deref() != Some(schema_version));
        self.stats.write().entry_count = entries.len();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let mut stats = self.stats.read().clone();
        stats.entry_count = entries.len();
        stats
    }

    /// Clean up expired entries.
    pub fn cleanup(&self) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let evicted = before - entries.len();

        if evicted > 0 {
            let mut stats = self.stats.write();
            stats.evictions += evicted as u64;
            stats.entry_count = entries.len();
        }
    }
}

/// Evict expired entries, then the least-hit ones until there is room.
fn evict_entries(entries: &mut HashMap<CacheKey, CacheEntry>, max_entries: usize) -> usize {
    let before = entries.len();
    entries.retain(|_, e| !e.is_expired());

    if entries.len() >= max_entries {
        let mut by_hits: Vec<(CacheKey, u64)> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.hit_count))
            .collect();
        by_hits.sort_by_key(|(_, hits)| *hits);

        let excess = entries.len() + 1 - max_entries;
        for (key, _) in by_hits.into_iter().take(excess) {
            entries.remove(&key);
        }
    }

    before - entries.len()
}
