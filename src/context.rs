//! Optimization context assembly.
//!
//! The context is the snapshot every planning decision reads: graph shape,
//! system resources, user preferences, and historical performance. Node and
//! relationship counts come from the live catalog; the remaining shape and
//! resource figures come from a pluggable [`SystemMetricsProvider`] so real
//! instrumentation can replace the placeholders without touching decision
//! logic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::GraphCatalog;
use crate::error::Result;
use crate::optimizer::stats::{QueryStatistics, StatisticsTracker};

/// Structural metrics describing the current knowledge graph.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphSizeMetrics {
    /// Total nodes in the graph.
    pub node_count: u64,
    /// Total relationships in the graph.
    pub relationship_count: u64,
    /// Mean degree over all nodes; 0 for an empty graph.
    pub avg_degree: f64,
    /// Largest observed node degree.
    pub max_degree: u64,
    /// Global clustering coefficient.
    pub clustering_coefficient: f64,
    /// Estimated graph diameter.
    pub diameter: u32,
}

/// Resource headroom the optimizer may plan against.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemResources {
    /// Memory available to query execution, in MiB.
    pub available_memory_mb: u64,
    /// Logical CPUs available to query execution.
    pub available_cpu: u32,
    /// Disk I/O capacity in abstract ops/sec.
    pub disk_io_capacity: u64,
    /// Network bandwidth in abstract units.
    pub network_bandwidth: u64,
    /// Number of queries currently in flight.
    pub concurrent_queries: u32,
}

/// How much explanation output the caller wants attached to results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationLevel {
    /// No explanation.
    None,
    /// Short, per-result justification.
    Basic,
    /// Full reasoning traces.
    Detailed,
}

/// Caller preferences that steer strategy selection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Upper bound the caller is willing to wait, in milliseconds.
    pub max_wait_time_ms: u64,
    /// 0 favors speed, 1 favors accuracy.
    pub accuracy_vs_speed: f64,
    /// 0 tolerates stale results, 1 demands fresh ones.
    pub result_freshness: f64,
    /// Requested explanation verbosity.
    pub explanation_level: ExplanationLevel,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            max_wait_time_ms: 5000,
            accuracy_vs_speed: 0.7,
            result_freshness: 0.5,
            explanation_level: ExplanationLevel::Basic,
        }
    }
}

/// Immutable snapshot consumed by one optimization call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationContext {
    /// Current graph shape.
    pub graph_size: GraphSizeMetrics,
    /// Current resource headroom.
    pub system_resources: SystemResources,
    /// Caller preferences.
    pub user_preferences: UserPreferences,
    /// Per-fingerprint history, ordered by fingerprint.
    pub historical_performance: Vec<QueryStatistics>,
    /// Overall system load in `[0, 1]`.
    pub current_load: f64,
}

/// Graph-shape figures not derivable from the two catalog counts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphShapeEstimates {
    /// Largest observed node degree.
    pub max_degree: u64,
    /// Global clustering coefficient.
    pub clustering_coefficient: f64,
    /// Estimated graph diameter.
    pub diameter: u32,
}

/// Supplies resource and graph-shape metrics to context assembly.
///
/// The shipped [`PlaceholderMetrics`] returns fixed stand-ins; a deployment
/// with real instrumentation implements this trait to feed live values in.
pub trait SystemMetricsProvider: Send + Sync {
    /// Graph-shape estimates beyond raw counts.
    fn graph_shape(&self) -> GraphShapeEstimates;
    /// Current resource headroom.
    fn system_resources(&self) -> SystemResources;
    /// Current system load in `[0, 1]`.
    fn current_load(&self) -> f64;
}

/// Fixed stand-in metrics pending real instrumentation.
///
/// These constants are intentional placeholders, not measurements.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderMetrics;

impl SystemMetricsProvider for PlaceholderMetrics {
    fn graph_shape(&self) -> GraphShapeEstimates {
        GraphShapeEstimates {
            max_degree: 100,
            clustering_coefficient: 0.3,
            diameter: 6,
        }
    }

    fn system_resources(&self) -> SystemResources {
        SystemResources {
            available_memory_mb: 8192,
            available_cpu: 4,
            disk_io_capacity: 1000,
            network_bandwidth: 1000,
            concurrent_queries: 10,
        }
    }

    fn current_load(&self) -> f64 {
        0.3
    }
}

/// Assembles [`OptimizationContext`] snapshots from the injected collaborators.
pub struct ContextProvider {
    catalog: Arc<dyn GraphCatalog>,
    metrics: Arc<dyn SystemMetricsProvider>,
    stats: Arc<StatisticsTracker>,
    preferences: UserPreferences,
}

impl ContextProvider {
    /// Creates a provider with default user preferences.
    pub fn new(
        catalog: Arc<dyn GraphCatalog>,
        metrics: Arc<dyn SystemMetricsProvider>,
        stats: Arc<StatisticsTracker>,
    ) -> Self {
        Self {
            catalog,
            metrics,
            stats,
            preferences: UserPreferences::default(),
        }
    }

    /// Overrides the default user preferences.
    pub fn with_preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Builds a fresh context snapshot.
    pub fn optimization_context(&self) -> Result<OptimizationContext> {
        let node_count = self.catalog.node_count()?;
        let relationship_count = self.catalog.relationship_count()?;
        let avg_degree = if node_count == 0 {
            0.0
        } else {
            (relationship_count * 2) as f64 / node_count as f64
        };
        let shape = self.metrics.graph_shape();
        Ok(OptimizationContext {
            graph_size: GraphSizeMetrics {
                node_count,
                relationship_count,
                avg_degree,
                max_degree: shape.max_degree,
                clustering_coefficient: shape.clustering_coefficient,
                diameter: shape.diameter,
            },
            system_resources: self.metrics.system_resources(),
            user_preferences: self.preferences,
            historical_performance: self.stats.history(),
            current_load: self.metrics.current_load(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FixedCatalog;

    fn provider(nodes: u64, relationships: u64) -> ContextProvider {
        ContextProvider::new(
            Arc::new(FixedCatalog::new(nodes, relationships)),
            Arc::new(PlaceholderMetrics),
            Arc::new(StatisticsTracker::new()),
        )
    }

    #[test]
    fn avg_degree_counts_both_endpoints() {
        let ctx = provider(10, 15).optimization_context().expect("context");
        assert_eq!(ctx.graph_size.node_count, 10);
        assert_eq!(ctx.graph_size.relationship_count, 15);
        assert!((ctx.graph_size.avg_degree - 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_graph_does_not_divide_by_zero() {
        let ctx = provider(0, 0).optimization_context().expect("context");
        assert_eq!(ctx.graph_size.avg_degree, 0.0);
    }

    #[test]
    fn placeholder_metrics_fill_uninstrumented_fields() {
        let ctx = provider(1, 1).optimization_context().expect("context");
        assert_eq!(ctx.graph_size.max_degree, 100);
        assert_eq!(ctx.graph_size.diameter, 6);
        assert_eq!(ctx.system_resources.available_cpu, 4);
        assert_eq!(ctx.system_resources.available_memory_mb, 8192);
        assert!((ctx.current_load - 0.3).abs() < 1e-9);
        assert_eq!(ctx.user_preferences.max_wait_time_ms, 5000);
    }

    #[test]
    fn history_flows_from_tracker() {
        let stats = Arc::new(StatisticsTracker::new());
        stats.record("q1", 10.0, 2, false);
        let provider = ContextProvider::new(
            Arc::new(FixedCatalog::new(1, 1)),
            Arc::new(PlaceholderMetrics),
            Arc::clone(&stats),
        );
        let ctx = provider.optimization_context().expect("context");
        assert_eq!(ctx.historical_performance.len(), 1);
        assert_eq!(ctx.historical_performance[0].query_hash, "q1");
    }
}
