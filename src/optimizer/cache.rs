//! Cache policy generation and the TTL result cache.
//!
//! The policy side decides *whether and how* a plan's results may be cached;
//! the [`ResultCache`] is the owned store the plan executor reads and writes.
//! Entries are versioned with an insertion generation so a deferred eviction
//! scheduled for an overwritten entry never removes its replacement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::optimizer::stats::QueryStatistics;

/// Caching granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLevel {
    /// Cache the final result payload of a plan.
    Result,
    /// Cache intermediate step outputs.
    Step,
}

/// How cache keys are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Key on the query fingerprint.
    Hash,
    /// Key on the full canonical serialization.
    Canonical,
}

/// One condition under which cached results become invalid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvalidationRule {
    /// What fires the rule, e.g. `time`.
    pub trigger: String,
    /// Condition checked when the trigger fires, e.g. `ttl_expired`.
    pub condition: String,
    /// How much of the cache the rule clears, e.g. `global`.
    pub scope: String,
}

/// Caching policy attached to a plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheStrategy {
    /// Whether caching applies to this plan at all.
    pub enabled: bool,
    /// Granularity at which results are cached.
    pub level: CacheLevel,
    /// Time-to-live for cached entries, in seconds.
    pub ttl_seconds: u64,
    /// Conditions that invalidate cached entries.
    pub invalidation_rules: Vec<InvalidationRule>,
    /// How cache keys are derived.
    pub key_strategy: KeyStrategy,
    /// Whether payloads are compressed at rest.
    pub compression_enabled: bool,
}

/// Decides the caching policy for a plan.
///
/// Currently a fixed result-level policy regardless of history; driving the
/// TTL from the per-fingerprint statistics is the natural next step once the
/// tracker has enough volume to be trustworthy.
pub fn cache_strategy_for(_history: &[QueryStatistics], ttl_seconds: u64) -> CacheStrategy {
    CacheStrategy {
        enabled: true,
        level: CacheLevel::Result,
        ttl_seconds,
        invalidation_rules: vec![InvalidationRule {
            trigger: "time".into(),
            condition: "ttl_expired".into(),
            scope: "global".into(),
        }],
        key_strategy: KeyStrategy::Hash,
        compression_enabled: true,
    }
}

struct CacheEntry {
    payload: serde_json::Value,
    generation: u64,
}

/// Hit/miss counters for the result cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through to the executor.
    pub misses: u64,
    /// Entries currently resident.
    pub entries: usize,
}

impl CacheMetrics {
    /// Fraction of lookups served from cache; 0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Concurrency-safe result cache keyed by query fingerprint.
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<FxHashMap<String, CacheEntry>>,
    generations: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the payload cached under `key`, counting the hit or miss.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.payload.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `payload` under `key` and schedules eviction after `ttl`.
    ///
    /// Returns the entry's generation. The eviction task re-checks the
    /// generation before removing anything, so overwriting a key neutralizes
    /// the earlier insertion's timer. Outside a tokio runtime no eviction is
    /// scheduled and the entry lives until overwritten or dropped.
    pub(crate) fn insert(
        self: &Arc<Self>,
        key: String,
        payload: serde_json::Value,
        ttl: Duration,
    ) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries.lock().insert(
            key.clone(),
            CacheEntry {
                payload,
                generation,
            },
        );
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let cache = Arc::clone(self);
            handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                cache.evict_if_generation(&key, generation);
            });
        }
        generation
    }

    /// Removes `key` only if it still holds the entry from `generation`.
    pub(crate) fn evict_if_generation(&self, key: &str, generation: u64) {
        let mut entries = self.entries.lock();
        if entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
        {
            entries.remove(key);
            debug!(key, "evicted expired cache entry");
        }
    }

    /// Current counters and entry count.
    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }
}
