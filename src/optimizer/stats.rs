//! Rolling per-fingerprint performance statistics.
//!
//! Every successful plan execution feeds one observation into the tracker.
//! Records live for the lifetime of the process and are never deleted; the
//! context provider snapshots them as `historical_performance` so future
//! planning decisions can account for observed behavior.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

/// Rolling performance profile for one query fingerprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryStatistics {
    /// Fingerprint this record belongs to.
    pub query_hash: String,
    /// Number of successful executions observed.
    pub execution_count: u64,
    /// Incremental mean of execution wall-clock time in milliseconds.
    pub avg_execution_time_ms: f64,
    /// Fastest observed execution in milliseconds.
    pub min_execution_time_ms: f64,
    /// Slowest observed execution in milliseconds.
    pub max_execution_time_ms: f64,
    /// Incremental mean of returned result counts.
    pub avg_result_count: f64,
    /// Fraction of executions that failed. Failed executions do not update
    /// the tracker, so this stays at zero until failure accounting is wired
    /// into a collaborator that observes them.
    pub error_rate: f64,
    /// Fraction of executions served from the result cache.
    pub cache_hit_rate: f64,
    /// Unix timestamp (seconds) of the most recent execution.
    pub last_executed: i64,
    /// `execution_count * 0.1`; used to rank fingerprints by demand.
    pub popularity_score: f64,
}

impl QueryStatistics {
    fn first(query_hash: &str, duration_ms: f64, result_count: u64, cache_hit: bool) -> Self {
        Self {
            query_hash: query_hash.to_owned(),
            execution_count: 1,
            avg_execution_time_ms: duration_ms,
            min_execution_time_ms: duration_ms,
            max_execution_time_ms: duration_ms,
            avg_result_count: result_count as f64,
            error_rate: 0.0,
            cache_hit_rate: if cache_hit { 1.0 } else { 0.0 },
            last_executed: OffsetDateTime::now_utc().unix_timestamp(),
            popularity_score: 0.1,
        }
    }

    fn observe(&mut self, duration_ms: f64, result_count: u64, cache_hit: bool) {
        self.execution_count += 1;
        let n = self.execution_count as f64;
        self.avg_execution_time_ms = (self.avg_execution_time_ms * (n - 1.0) + duration_ms) / n;
        self.min_execution_time_ms = self.min_execution_time_ms.min(duration_ms);
        self.max_execution_time_ms = self.max_execution_time_ms.max(duration_ms);
        self.avg_result_count = (self.avg_result_count * (n - 1.0) + result_count as f64) / n;
        let hit = if cache_hit { 1.0 } else { 0.0 };
        self.cache_hit_rate = (self.cache_hit_rate * (n - 1.0) + hit) / n;
        self.last_executed = OffsetDateTime::now_utc().unix_timestamp();
        self.popularity_score = self.execution_count as f64 * 0.1;
    }
}

/// Concurrency-safe table of [`QueryStatistics`] keyed by fingerprint.
#[derive(Debug, Default)]
pub struct StatisticsTracker {
    table: Mutex<FxHashMap<String, QueryStatistics>>,
}

impl StatisticsTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a tracker from a previously taken [`snapshot`](Self::snapshot).
    ///
    /// Malformed snapshots are logged and ignored; the tracker starts empty
    /// rather than failing optimizer construction.
    pub fn from_snapshot(snapshot: serde_json::Value) -> Self {
        match serde_json::from_value::<Vec<QueryStatistics>>(snapshot) {
            Ok(records) => {
                let table = records
                    .into_iter()
                    .map(|record| (record.query_hash.clone(), record))
                    .collect();
                Self {
                    table: Mutex::new(table),
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to restore statistics snapshot, starting empty");
                Self::new()
            }
        }
    }

    /// Records one successful execution for `query_hash`.
    pub fn record(&self, query_hash: &str, duration_ms: f64, result_count: u64, cache_hit: bool) {
        let mut table = self.table.lock();
        match table.get_mut(query_hash) {
            Some(record) => record.observe(duration_ms, result_count, cache_hit),
            None => {
                table.insert(
                    query_hash.to_owned(),
                    QueryStatistics::first(query_hash, duration_ms, result_count, cache_hit),
                );
            }
        }
    }

    /// Returns the record for `query_hash`, if any executions were observed.
    pub fn get(&self, query_hash: &str) -> Option<QueryStatistics> {
        self.table.lock().get(query_hash).cloned()
    }

    /// Returns all records ordered by fingerprint for deterministic snapshots.
    pub fn history(&self) -> Vec<QueryStatistics> {
        let mut records: Vec<_> = self.table.lock().values().cloned().collect();
        records.sort_by(|a, b| a.query_hash.cmp(&b.query_hash));
        records
    }

    /// Serializes the tracked records for external persistence.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self.history()).unwrap_or(serde_json::Value::Null)
    }

    /// Number of distinct fingerprints tracked.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Whether any fingerprint has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}
