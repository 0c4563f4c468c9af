//! Execution plan model and step construction.
//!
//! A [`QueryPlan`] is the optimizer's sole output: an ordered list of
//! [`ExecutionStep`]s with cost/time/row estimates, plus the caching,
//! indexing, parallelization, and resource advice generated alongside.

use serde::{Deserialize, Serialize};

use crate::error::{NoctuaError, Result};
use crate::context::{GraphSizeMetrics, SystemResources};
use crate::optimizer::cache::CacheStrategy;
use crate::optimizer::index::{IndexKind, IndexRecommendation};
use crate::optimizer::parallel::ParallelizationPlan;
use crate::optimizer::resources::ResourceRequirements;
use crate::optimizer::strategy::{PrimaryStrategy, QueryStrategy};
use crate::query::{ReasoningQuery, SearchQuery, SourceQuery};

/// Kind of work a single step performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// Approximate-nearest-neighbor search over embeddings.
    VectorSearch,
    /// Relationship traversal through the graph store.
    GraphTraversal,
    /// Combine two result streams on a shared key.
    Join,
    /// Drop rows that fail a predicate.
    Filter,
    /// Order rows.
    Sort,
    /// Reduce rows to a combined result.
    Aggregate,
}

/// How a step expects to use a storage index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexUsage {
    /// Name of the index consulted.
    pub index_name: String,
    /// Index structure.
    pub index_type: IndexKind,
    /// Access pattern, e.g. `similarity_scan` or `range_scan`.
    pub usage: String,
    /// Fraction of the indexed data the access touches.
    pub selectivity: f64,
    /// How much the index is expected to help, in `[0, 1]`.
    pub effectiveness: f64,
}

/// One unit of planned work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Identifier unique within the plan.
    pub step_id: String,
    /// Kind of work performed.
    pub step_type: StepType,
    /// Human-readable summary for explain output.
    pub description: String,
    /// Abstract cost units.
    pub estimated_cost: f64,
    /// Expected wall-clock time in milliseconds.
    pub estimated_time_ms: f64,
    /// Expected output row count.
    pub estimated_rows: u64,
    /// Step ids this step waits on; may only reference earlier steps.
    pub dependencies: Vec<String>,
    /// Whether the executing engine may run this step concurrently.
    pub parallelizable: bool,
    /// Whether this step's output may be cached.
    pub cacheable: bool,
    /// Indexes the step expects to consult.
    pub index_usage: Vec<IndexUsage>,
}

/// Which kind of query a plan was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Hybrid search.
    Search,
    /// Multi-hop reasoning.
    Reasoning,
}

/// The rewritten query handed to the injected executor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizedQuery {
    /// Kind of query.
    pub query_type: QueryType,
    /// Strategy the plan commits to.
    pub strategy: QueryStrategy,
    /// Filters carried over from the original query, canonically serialized.
    pub filters: serde_json::Value,
    /// Result ordering the executor should apply.
    pub ordering: Option<String>,
    /// Result count limit.
    pub limit: Option<u64>,
    /// Join descriptions, when branches are fused.
    pub joins: Vec<String>,
    /// Nested queries; unused by the current builders.
    pub subqueries: Vec<OptimizedQuery>,
    /// Names of optimizations the plan applies.
    pub optimizations: Vec<String>,
}

/// Reduced context snapshot recorded on every plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Graph shape at planning time.
    pub graph_size: GraphSizeMetrics,
    /// Resource headroom at planning time.
    pub system_resources: SystemResources,
    /// System load at planning time.
    pub current_load: f64,
}

/// Plan provenance used for caching and statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    /// Fingerprint of the original query.
    pub query_hash: String,
    /// Version of the optimizer that produced the plan.
    pub optimization_version: String,
    /// Context the plan was built against.
    pub context_snapshot: ContextSnapshot,
}

/// A complete, executable query plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Identifier unique per optimization call; the only random output.
    pub id: String,
    /// The query this plan was built for.
    pub original_query: SourceQuery,
    /// The rewritten query handed to the executor.
    pub optimized_query: OptimizedQuery,
    /// Ordered steps; dependencies only reference earlier entries.
    pub execution_steps: Vec<ExecutionStep>,
    /// Straight sum of step costs. Kept as a linear sum even for
    /// parallelizable steps; see [`critical_path_time_ms`](Self::critical_path_time_ms).
    pub estimated_cost: f64,
    /// Straight sum of step times, same caveat as `estimated_cost`.
    pub estimated_time_ms: f64,
    /// Caching policy for the plan's results.
    pub cache_strategy: CacheStrategy,
    /// Indexes worth building for this workload.
    pub index_recommendations: Vec<IndexRecommendation>,
    /// Advisory concurrency plan.
    pub parallelization: ParallelizationPlan,
    /// Estimated resource envelope.
    pub resources: ResourceRequirements,
    /// Provenance.
    pub metadata: PlanMetadata,
}

impl QueryPlan {
    /// Checks the structural invariants: dependencies reference earlier steps
    /// only (which makes the dependency graph acyclic) and the plan totals
    /// equal the step sums.
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.execution_steps.len());
        for step in &self.execution_steps {
            for dep in &step.dependencies {
                if !seen.contains(&dep.as_str()) {
                    return Err(NoctuaError::InvalidArgument(format!(
                        "step '{}' depends on '{dep}', which is not an earlier step",
                        step.step_id
                    )));
                }
            }
            if seen.contains(&step.step_id.as_str()) {
                return Err(NoctuaError::InvalidArgument(format!(
                    "duplicate step id '{}'",
                    step.step_id
                )));
            }
            seen.push(&step.step_id);
        }
        let cost: f64 = self.execution_steps.iter().map(|s| s.estimated_cost).sum();
        let time: f64 = self
            .execution_steps
            .iter()
            .map(|s| s.estimated_time_ms)
            .sum();
        if (cost - self.estimated_cost).abs() > 1e-9 || (time - self.estimated_time_ms).abs() > 1e-9
        {
            return Err(NoctuaError::InvalidArgument(
                "plan totals do not match step sums".into(),
            ));
        }
        Ok(())
    }

    /// Longest-path time over the dependency graph, in milliseconds.
    ///
    /// This is the parallel-aware estimate. `estimated_time_ms` deliberately
    /// stays the linear sum for compatibility with historical plan output;
    /// do not fold this value into it.
    pub fn critical_path_time_ms(&self) -> f64 {
        let mut finish: Vec<f64> = Vec::with_capacity(self.execution_steps.len());
        for (idx, step) in self.execution_steps.iter().enumerate() {
            let ready = step
                .dependencies
                .iter()
                .filter_map(|dep| {
                    self.execution_steps[..idx]
                        .iter()
                        .position(|s| &s.step_id == dep)
                        .map(|pos| finish[pos])
                })
                .fold(0.0, f64::max);
            finish.push(ready + step.estimated_time_ms);
        }
        finish.into_iter().fold(0.0, f64::max)
    }

    /// Builds a human-readable explain tree for the plan.
    pub fn explain(&self) -> ExplainNode {
        let mut root = ExplainNode::new("QueryPlan");
        root.props.push(ExplainProp::new("id", &self.id));
        root.props.push(ExplainProp::new(
            "strategy",
            format!("{:?}", self.optimized_query.strategy.primary),
        ));
        root.props.push(ExplainProp::new(
            "estimated_cost",
            format!("{:.1}", self.estimated_cost),
        ));
        root.props.push(ExplainProp::new(
            "estimated_time_ms",
            format!("{:.1}", self.estimated_time_ms),
        ));
        root.props.push(ExplainProp::new(
            "critical_path_ms",
            format!("{:.1}", self.critical_path_time_ms()),
        ));
        for step in &self.execution_steps {
            let mut node = ExplainNode::new(&step.step_id);
            node.props
                .push(ExplainProp::new("type", format!("{:?}", step.step_type)));
            node.props.push(ExplainProp::new(
                "cost",
                format!("{:.1}", step.estimated_cost),
            ));
            node.props.push(ExplainProp::new(
                "time_ms",
                format!("{:.1}", step.estimated_time_ms),
            ));
            node.props
                .push(ExplainProp::new("rows", step.estimated_rows.to_string()));
            if !step.dependencies.is_empty() {
                node.props.push(ExplainProp::new(
                    "depends_on",
                    step.dependencies.join(", "),
                ));
            }
            root.inputs.push(node);
        }
        root
    }
}

/// Node in the explain tree.
#[derive(Clone, Debug)]
pub struct ExplainNode {
    /// Operator or step name.
    pub op: String,
    /// Key/value annotations.
    pub props: Vec<ExplainProp>,
    /// Child nodes.
    pub inputs: Vec<ExplainNode>,
}

impl ExplainNode {
    /// Creates a node with no annotations or children.
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            props: Vec::new(),
            inputs: Vec::new(),
        }
    }

    /// Renders the tree as indented text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&self.op);
        if !self.props.is_empty() {
            let props: Vec<String> = self
                .props
                .iter()
                .map(|p| format!("{}={}", p.key, p.value))
                .collect();
            out.push_str(&format!(" [{}]", props.join(" ")));
        }
        out.push('\n');
        for child in &self.inputs {
            child.render_into(out, depth + 1);
        }
    }
}

/// Single annotation on an [`ExplainNode`].
#[derive(Clone, Debug)]
pub struct ExplainProp {
    /// Annotation key.
    pub key: String,
    /// Annotation value, already rendered.
    pub value: String,
}

impl ExplainProp {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Generates a fresh plan id.
pub(crate) fn plan_id() -> String {
    format!("plan-{:016x}", rand::random::<u64>())
}

const DEFAULT_SEARCH_ROWS: u64 = 20;

fn hnsw_usage() -> IndexUsage {
    IndexUsage {
        index_name: "chunk_embedding_hnsw".into(),
        index_type: IndexKind::Hnsw,
        usage: "similarity_scan".into(),
        selectivity: 0.1,
        effectiveness: 0.9,
    }
}

fn relationship_btree_usage() -> IndexUsage {
    IndexUsage {
        index_name: "relationship_source_btree".into(),
        index_type: IndexKind::BTree,
        usage: "range_scan".into(),
        selectivity: 0.3,
        effectiveness: 0.7,
    }
}

fn entity_lookup_usage() -> IndexUsage {
    IndexUsage {
        index_name: "entity_id_lookup".into(),
        index_type: IndexKind::Hash,
        usage: "point_lookup".into(),
        selectivity: 0.001,
        effectiveness: 0.95,
    }
}

/// Expands a search strategy into ordered execution steps.
pub(crate) fn build_search_steps(query: &SearchQuery, strategy: &QueryStrategy) -> Vec<ExecutionStep> {
    let rows = query.options.max_results.unwrap_or(DEFAULT_SEARCH_ROWS);
    let mut steps = Vec::new();
    let vector_side = matches!(
        strategy.primary,
        PrimaryStrategy::VectorFirst | PrimaryStrategy::HybridParallel
    );
    let graph_side = matches!(
        strategy.primary,
        PrimaryStrategy::GraphFirst | PrimaryStrategy::HybridParallel
    );
    if vector_side {
        steps.push(ExecutionStep {
            step_id: "vector_search".into(),
            step_type: StepType::VectorSearch,
            description: "HNSW similarity scan over chunk embeddings".into(),
            estimated_cost: 10.0,
            estimated_time_ms: 50.0,
            estimated_rows: rows,
            dependencies: Vec::new(),
            parallelizable: true,
            cacheable: true,
            index_usage: vec![hnsw_usage()],
        });
    }
    if graph_side {
        steps.push(ExecutionStep {
            step_id: "graph_traversal".into(),
            step_type: StepType::GraphTraversal,
            description: "expand matches through typed relationships".into(),
            estimated_cost: 20.0,
            estimated_time_ms: 100.0,
            estimated_rows: rows,
            dependencies: Vec::new(),
            parallelizable: true,
            cacheable: false,
            index_usage: vec![relationship_btree_usage()],
        });
    }
    if strategy.primary == PrimaryStrategy::HybridParallel {
        steps.push(ExecutionStep {
            step_id: "result_fusion".into(),
            step_type: StepType::Aggregate,
            description: "rank-merge vector and graph result streams".into(),
            estimated_cost: 5.0,
            estimated_time_ms: 20.0,
            estimated_rows: rows,
            dependencies: vec!["vector_search".into(), "graph_traversal".into()],
            parallelizable: false,
            cacheable: true,
            index_usage: Vec::new(),
        });
    }
    steps
}

/// Expands a reasoning query into its fixed three-step pipeline.
pub(crate) fn build_reasoning_steps(query: &ReasoningQuery) -> Vec<ExecutionStep> {
    let fanout = query.start_entities.len() as u64;
    let depth = query.max_depth;
    let scale = (depth as u64 * fanout) as f64;
    // Worst-case fan-out estimate; deliberately exponential in depth.
    let traversal_rows = 10u64.checked_pow(depth).unwrap_or(u64::MAX);
    vec![
        ExecutionStep {
            step_id: "load_entities".into(),
            step_type: StepType::Filter,
            description: "resolve start entities by id".into(),
            estimated_cost: 2.0,
            estimated_time_ms: 10.0,
            estimated_rows: fanout,
            dependencies: Vec::new(),
            parallelizable: false,
            cacheable: true,
            index_usage: vec![entity_lookup_usage()],
        },
        ExecutionStep {
            step_id: "multi_hop_traversal".into(),
            step_type: StepType::GraphTraversal,
            description: format!("traverse up to {depth} hops from {fanout} entities"),
            estimated_cost: scale * 5.0,
            estimated_time_ms: scale * 20.0,
            estimated_rows: traversal_rows,
            dependencies: vec!["load_entities".into()],
            parallelizable: false,
            cacheable: false,
            index_usage: vec![relationship_btree_usage()],
        },
        ExecutionStep {
            step_id: "path_evaluation".into(),
            step_type: StepType::Aggregate,
            description: "score and rank discovered paths".into(),
            estimated_cost: 10.0,
            estimated_time_ms: 30.0,
            estimated_rows: 100,
            dependencies: vec!["multi_hop_traversal".into()],
            parallelizable: false,
            cacheable: true,
            index_usage: Vec::new(),
        },
    ]
}
