//! Plan execution orchestration.
//!
//! The executor does not run steps itself; it wraps the injected engine
//! callback with cache lookup, cache fill, and statistics updates. Executor
//! failures are logged with the plan id and propagated unchanged, without
//! touching statistics or the cache.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error};

use crate::error::Result;
use crate::optimizer::cache::{CacheMetrics, ResultCache};
use crate::optimizer::plan::{IndexUsage, OptimizedQuery, QueryPlan};
use crate::optimizer::stats::StatisticsTracker;

/// Observed metrics for one plan execution.
#[derive(Clone, Debug, PartialEq)]
pub struct ActualMetrics {
    /// Wall-clock duration in milliseconds.
    pub execution_time_ms: f64,
    /// Number of results returned.
    pub result_count: u64,
    /// 1 when served from cache, 0 otherwise.
    pub cache_hits: u32,
    /// Indexes consulted; mirrors the plan's expectations until the engines
    /// report real usage.
    pub index_usage: Vec<IndexUsage>,
}

/// Result payload plus observed metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionOutcome {
    /// Raw result payload from the cache or the engine.
    pub results: Value,
    /// What actually happened, for callers and the statistics tracker.
    pub actual_metrics: ActualMetrics,
}

/// Runs optimized plans against an injected engine callback.
///
/// Owns the result cache and shares the statistics tracker with the context
/// provider, so observed performance feeds back into future optimization.
pub struct PlanExecutor {
    cache: Arc<ResultCache>,
    stats: Arc<StatisticsTracker>,
}

impl Default for PlanExecutor {
    fn default() -> Self {
        Self::new(Arc::new(StatisticsTracker::new()))
    }
}

impl PlanExecutor {
    /// Creates an executor sharing the given statistics tracker.
    pub fn new(stats: Arc<StatisticsTracker>) -> Self {
        Self {
            cache: Arc::new(ResultCache::new()),
            stats,
        }
    }

    /// The shared statistics tracker.
    pub fn statistics(&self) -> Arc<StatisticsTracker> {
        Arc::clone(&self.stats)
    }

    /// Current cache counters.
    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    /// Executes `plan` through the injected `executor` callback.
    ///
    /// With caching enabled, a fingerprint hit returns the cached payload
    /// without invoking the callback at all; a miss invokes it and caches the
    /// result for the plan's TTL. Successful executions (cached or not)
    /// update the statistics tracker.
    pub async fn execute_optimized_plan<F, Fut>(
        &self,
        plan: &QueryPlan,
        executor: F,
    ) -> Result<ExecutionOutcome>
    where
        F: FnOnce(OptimizedQuery) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let started = Instant::now();
        let query_hash = plan.metadata.query_hash.as_str();

        if plan.cache_strategy.enabled {
            if let Some(payload) = self.cache.get(query_hash) {
                let execution_time_ms = elapsed_ms(started);
                let result_count = count_results(&payload);
                debug!(plan_id = %plan.id, query_hash, "plan served from result cache");
                self.stats
                    .record(query_hash, execution_time_ms, result_count, true);
                return Ok(ExecutionOutcome {
                    results: payload,
                    actual_metrics: ActualMetrics {
                        execution_time_ms,
                        result_count,
                        cache_hits: 1,
                        index_usage: Vec::new(),
                    },
                });
            }
        }

        let payload = match executor(plan.optimized_query.clone()).await {
            Ok(payload) => payload,
            Err(err) => {
                error!(plan_id = %plan.id, query_hash, error = %err, "plan execution failed");
                return Err(err);
            }
        };

        if plan.cache_strategy.enabled {
            self.cache.insert(
                query_hash.to_owned(),
                payload.clone(),
                Duration::from_secs(plan.cache_strategy.ttl_seconds),
            );
        }

        let execution_time_ms = elapsed_ms(started);
        let result_count = count_results(&payload);
        self.stats
            .record(query_hash, execution_time_ms, result_count, false);
        debug!(
            plan_id = %plan.id,
            query_hash,
            execution_time_ms,
            result_count,
            "plan executed"
        );
        Ok(ExecutionOutcome {
            results: payload,
            actual_metrics: ActualMetrics {
                execution_time_ms,
                result_count,
                cache_hits: 0,
                index_usage: plan
                    .execution_steps
                    .iter()
                    .flat_map(|step| step.index_usage.iter().cloned())
                    .collect(),
            },
        })
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn count_results(payload: &Value) -> u64 {
    match payload {
        Value::Array(items) => items.len() as u64,
        Value::Null => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_results_count_as_one() {
        assert_eq!(count_results(&json!({"answer": 42})), 1);
        assert_eq!(count_results(&json!([1, 2, 3])), 3);
        assert_eq!(count_results(&Value::Null), 0);
    }
}
