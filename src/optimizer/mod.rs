//! Query optimization core.
//!
//! Turns search and reasoning requests into cost-estimated, cacheable,
//! parallelizable execution plans, executes them through an injected engine
//! callback, and learns from observed performance.

/// Structural query analysis (complexity, selectivity).
pub mod analyze;

/// Cache policy generation and the TTL result cache.
pub mod cache;

/// Plan execution orchestration against the injected engine.
pub mod executor;

/// Deterministic query fingerprints for caching and statistics.
pub mod fingerprint;

/// Storage index recommendations.
pub mod index;

/// Advisory parallelization planning.
pub mod parallel;

/// Execution plan model and step construction.
pub mod plan;

/// Plan resource requirement estimation.
pub mod resources;

/// Per-fingerprint rolling performance statistics.
pub mod stats;

/// Strategy candidate generation and selection.
pub mod strategy;

use serde_json::json;
use tracing::debug;

use crate::context::OptimizationContext;
use crate::error::Result;
use crate::query::{ReasoningQuery, SearchQuery, SourceQuery};

pub use executor::{ActualMetrics, ExecutionOutcome, PlanExecutor};
pub use plan::{ExecutionStep, OptimizedQuery, QueryPlan, QueryType, StepType};
pub use strategy::{PrimaryStrategy, QueryStrategy};

use plan::{ContextSnapshot, PlanMetadata};

/// Tunables for plan construction.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    /// Version string stamped into plan metadata.
    pub optimization_version: String,
    /// TTL handed to the cache strategy generator, in seconds.
    pub cache_ttl_seconds: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            optimization_version: env!("CARGO_PKG_VERSION").to_string(),
            cache_ttl_seconds: 300,
        }
    }
}

/// Builds [`QueryPlan`]s for search and reasoning queries.
///
/// Plan construction is synchronous and side-effect-free; a single optimizer
/// may be shared freely across threads.
#[derive(Debug, Default)]
pub struct QueryOptimizer {
    config: OptimizerConfig,
}

impl QueryOptimizer {
    /// Creates an optimizer with the given configuration.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Optimizes a hybrid search query against the given context.
    pub fn optimize_search_query(
        &self,
        query: &SearchQuery,
        context: &OptimizationContext,
    ) -> Result<QueryPlan> {
        let analysis = analyze::analyze_search(query);
        debug!(
            complexity = analysis.complexity,
            selectivity = analysis.selectivity,
            "analyzed search query"
        );
        let candidates = strategy::search_candidates(context);
        let selected = strategy::select_strategy(&candidates, context);
        let steps = plan::build_search_steps(query, &selected);
        let limit = Some(query.options.max_results.unwrap_or(20));
        let filters = serde_json::to_value(&query.filters)?;
        self.assemble(
            SourceQuery::Search(query.clone()),
            QueryType::Search,
            selected,
            steps,
            filters,
            Some("similarity desc".into()),
            limit,
            context,
        )
    }

    /// Optimizes a multi-hop reasoning query against the given context.
    pub fn optimize_reasoning_query(
        &self,
        query: &ReasoningQuery,
        context: &OptimizationContext,
    ) -> Result<QueryPlan> {
        let analysis = analyze::analyze_reasoning(query);
        let candidates = strategy::reasoning_candidates(query, &analysis);
        let selected = strategy::select_strategy(&candidates, context);
        let steps = plan::build_reasoning_steps(query);
        let filters = json!({
            "min_confidence": query.min_confidence,
            "target_entities": query.target_entities,
        });
        self.assemble(
            SourceQuery::Reasoning(query.clone()),
            QueryType::Reasoning,
            selected,
            steps,
            filters,
            Some("confidence desc".into()),
            None,
            context,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        original_query: SourceQuery,
        query_type: QueryType,
        strategy: QueryStrategy,
        steps: Vec<ExecutionStep>,
        filters: serde_json::Value,
        ordering: Option<String>,
        limit: Option<u64>,
        context: &OptimizationContext,
    ) -> Result<QueryPlan> {
        let query_hash = fingerprint::fingerprint(&original_query)?;
        let parallelization = parallel::plan_parallelism(&steps, &context.system_resources);
        let resources = resources::estimate_resources(&steps);
        let cache_strategy = cache::cache_strategy_for(
            &context.historical_performance,
            self.config.cache_ttl_seconds,
        );
        let index_recommendations = index::recommend_indexes(&context.graph_size);

        let mut joins = Vec::new();
        if steps.iter().any(|step| step.step_id == "result_fusion") {
            joins.push("result_fusion(vector_search, graph_traversal)".to_string());
        }
        let mut optimizations = Vec::new();
        if strategy.pruning.enabled {
            optimizations.push("pruning".to_string());
        }
        if strategy.pruning.early_termination {
            optimizations.push("early_termination".to_string());
        }
        if strategy.pruning.redundancy_elimination {
            optimizations.push("redundancy_elimination".to_string());
        }
        if parallelization.enabled {
            optimizations.push("parallel_execution".to_string());
        }
        if cache_strategy.enabled {
            optimizations.push("result_cache".to_string());
        }

        // Linear sums by design, even when steps may run in parallel; the
        // dependency-aware figure is critical_path_time_ms on the plan.
        let estimated_cost = steps.iter().map(|step| step.estimated_cost).sum();
        let estimated_time_ms = steps.iter().map(|step| step.estimated_time_ms).sum();

        let plan = QueryPlan {
            id: plan::plan_id(),
            original_query,
            optimized_query: OptimizedQuery {
                query_type,
                strategy,
                filters,
                ordering,
                limit,
                joins,
                subqueries: Vec::new(),
                optimizations,
            },
            execution_steps: steps,
            estimated_cost,
            estimated_time_ms,
            cache_strategy,
            index_recommendations,
            parallelization,
            resources,
            metadata: PlanMetadata {
                query_hash,
                optimization_version: self.config.optimization_version.clone(),
                context_snapshot: ContextSnapshot {
                    graph_size: context.graph_size,
                    system_resources: context.system_resources,
                    current_load: context.current_load,
                },
            },
        };
        debug_assert!(plan.validate().is_ok());
        debug!(
            plan_id = %plan.id,
            query_hash = %plan.metadata.query_hash,
            strategy = ?plan.optimized_query.strategy.primary,
            steps = plan.execution_steps.len(),
            estimated_cost,
            "plan assembled"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FixedCatalog;
    use crate::context::{ContextProvider, PlaceholderMetrics, UserPreferences};
    use crate::query::ReasoningType;
    use std::sync::Arc;

    fn context(nodes: u64) -> OptimizationContext {
        ContextProvider::new(
            Arc::new(FixedCatalog::new(nodes, nodes)),
            Arc::new(PlaceholderMetrics),
            Arc::new(stats::StatisticsTracker::new()),
        )
        .optimization_context()
        .expect("context")
    }

    fn hybrid_context() -> OptimizationContext {
        let mut ctx = ContextProvider::new(
            Arc::new(FixedCatalog::new(200_000, 400_000)),
            Arc::new(PlaceholderMetrics),
            Arc::new(stats::StatisticsTracker::new()),
        )
        .with_preferences(UserPreferences {
            accuracy_vs_speed: 0.8,
            ..UserPreferences::default()
        })
        .optimization_context()
        .expect("context");
        ctx.system_resources.available_cpu = 4;
        ctx
    }

    fn reasoning_query() -> ReasoningQuery {
        ReasoningQuery {
            start_entities: vec!["a".into(), "b".into()],
            target_entities: None,
            max_depth: 3,
            min_confidence: 0.5,
            reasoning_type: ReasoningType::Exploratory,
        }
    }

    #[test]
    fn search_plan_totals_equal_step_sums() {
        let optimizer = QueryOptimizer::default();
        let plan = optimizer
            .optimize_search_query(&SearchQuery::new("rust"), &hybrid_context())
            .expect("plan");
        plan.validate().expect("valid plan");
        let cost: f64 = plan.execution_steps.iter().map(|s| s.estimated_cost).sum();
        let time: f64 = plan
            .execution_steps
            .iter()
            .map(|s| s.estimated_time_ms)
            .sum();
        assert_eq!(plan.estimated_cost, cost);
        assert_eq!(plan.estimated_time_ms, time);
    }

    #[test]
    fn hybrid_eligible_context_selects_hybrid_parallel() {
        let optimizer = QueryOptimizer::default();
        let plan = optimizer
            .optimize_search_query(&SearchQuery::new("rust"), &hybrid_context())
            .expect("plan");
        assert_eq!(
            plan.optimized_query.strategy.primary,
            PrimaryStrategy::HybridParallel
        );
        let ids: Vec<_> = plan
            .execution_steps
            .iter()
            .map(|s| s.step_id.as_str())
            .collect();
        assert_eq!(ids, vec!["vector_search", "graph_traversal", "result_fusion"]);
        assert!(plan.parallelization.enabled);
        assert!(!plan.optimized_query.joins.is_empty());
    }

    #[test]
    fn critical_path_is_shorter_than_linear_sum_for_hybrid() {
        let optimizer = QueryOptimizer::default();
        let plan = optimizer
            .optimize_search_query(&SearchQuery::new("rust"), &hybrid_context())
            .expect("plan");
        // 50 + 100 + 20 linear vs max(50, 100) + 20 on the critical path.
        assert_eq!(plan.estimated_time_ms, 170.0);
        assert_eq!(plan.critical_path_time_ms(), 120.0);
    }

    #[test]
    fn reasoning_plan_has_the_fixed_pipeline() {
        let optimizer = QueryOptimizer::default();
        let plan = optimizer
            .optimize_reasoning_query(&reasoning_query(), &context(1_000))
            .expect("plan");
        plan.validate().expect("valid plan");
        let ids: Vec<_> = plan
            .execution_steps
            .iter()
            .map(|s| s.step_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["load_entities", "multi_hop_traversal", "path_evaluation"]
        );
        assert_eq!(plan.execution_steps[1].estimated_rows, 1_000);
        assert_eq!(plan.execution_steps[1].estimated_cost, 30.0);
        assert_eq!(plan.estimated_cost, 42.0);
        assert_eq!(plan.estimated_time_ms, 160.0);
    }

    #[test]
    fn plans_are_deterministic_apart_from_the_id() {
        let optimizer = QueryOptimizer::default();
        let ctx = hybrid_context();
        let query = SearchQuery::new("deterministic");
        let a = optimizer.optimize_search_query(&query, &ctx).expect("plan");
        let b = optimizer.optimize_search_query(&query, &ctx).expect("plan");
        assert_ne!(a.id, b.id);
        assert_eq!(a.optimized_query, b.optimized_query);
        assert_eq!(a.execution_steps, b.execution_steps);
        assert_eq!(a.estimated_cost, b.estimated_cost);
        assert_eq!(a.estimated_time_ms, b.estimated_time_ms);
        assert_eq!(a.metadata.query_hash, b.metadata.query_hash);
    }

    #[test]
    fn index_recommendations_follow_graph_size() {
        let optimizer = QueryOptimizer::default();
        let query = SearchQuery::new("rust");
        let small = optimizer
            .optimize_search_query(&query, &context(9_999))
            .expect("plan");
        assert!(small.index_recommendations.is_empty());
        let large = optimizer
            .optimize_search_query(&query, &context(10_001))
            .expect("plan");
        assert_eq!(large.index_recommendations.len(), 1);
        assert_eq!(
            large.index_recommendations[0].columns,
            vec!["source_entity_id", "confidence"]
        );
    }

    #[test]
    fn explain_renders_every_step() {
        let optimizer = QueryOptimizer::default();
        let plan = optimizer
            .optimize_reasoning_query(&reasoning_query(), &context(1_000))
            .expect("plan");
        let rendered = plan.explain().render();
        assert!(rendered.contains("QueryPlan"));
        assert!(rendered.contains("multi_hop_traversal"));
        assert!(rendered.contains("depends_on=load_entities"));
    }
}
