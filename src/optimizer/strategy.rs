//! Strategy candidate generation and selection.
//!
//! Generation proposes one or more [`QueryStrategy`] candidates for an
//! analyzed query; selection scores them against the optimization context and
//! picks the winner. Both phases are pure functions of their inputs, so plans
//! stay reproducible (§ determinism tests rely on this).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::context::OptimizationContext;
use crate::optimizer::analyze::QueryAnalysis;
use crate::query::{ReasoningQuery, ReasoningType};

/// Which retrieval engine leads the plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryStrategy {
    /// Vector similarity search first, graph expansion after.
    VectorFirst,
    /// Graph traversal first, vector re-ranking after.
    GraphFirst,
    /// Vector and graph branches run concurrently and are fused.
    HybridParallel,
    /// Engine chosen per-branch at execution time.
    Adaptive,
}

/// Degraded mode when the primary strategy cannot complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Serve from vector search alone.
    VectorOnly,
    /// Serve from graph traversal alone.
    GraphOnly,
}

/// Traversal discipline for the graph-side work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    /// Frontier-at-a-time expansion.
    BreadthFirst,
    /// Chase each branch to depth before backtracking.
    DepthFirst,
    /// Expand from both endpoints and meet in the middle.
    Bidirectional,
    /// Priority-guided expansion using edge confidence.
    Heuristic,
}

/// Bounds on traversal breadth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PruningRules {
    /// Whether pruning applies at all.
    pub enabled: bool,
    /// Branches below this confidence are cut.
    pub confidence_threshold: f64,
    /// Hard cap on live branches.
    pub max_branches: u32,
    /// Stop once enough results are in hand.
    pub early_termination: bool,
    /// Collapse branches that revisit the same frontier.
    pub redundancy_elimination: bool,
}

impl Default for PruningRules {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.3,
            max_branches: 100,
            early_termination: true,
            redundancy_elimination: true,
        }
    }
}

/// A complete candidate execution strategy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryStrategy {
    /// Leading retrieval engine.
    pub primary: PrimaryStrategy,
    /// Degraded mode, when one is defined for the primary.
    pub fallback: Option<FallbackStrategy>,
    /// Graph traversal discipline.
    pub reasoning: ReasoningMode,
    /// Traversal bounds.
    pub pruning: PruningRules,
}

/// Baseline candidate used whenever generation produces nothing better.
fn baseline() -> QueryStrategy {
    QueryStrategy {
        primary: PrimaryStrategy::GraphFirst,
        fallback: None,
        reasoning: ReasoningMode::BreadthFirst,
        pruning: PruningRules::default(),
    }
}

/// Proposes candidate strategies for a search query.
pub fn search_candidates(context: &OptimizationContext) -> Vec<QueryStrategy> {
    let mut candidates = vec![
        QueryStrategy {
            primary: PrimaryStrategy::VectorFirst,
            fallback: Some(FallbackStrategy::GraphOnly),
            reasoning: ReasoningMode::BreadthFirst,
            pruning: PruningRules {
                enabled: true,
                confidence_threshold: 0.3,
                max_branches: 100,
                early_termination: true,
                redundancy_elimination: true,
            },
        },
        QueryStrategy {
            primary: PrimaryStrategy::GraphFirst,
            fallback: Some(FallbackStrategy::VectorOnly),
            reasoning: ReasoningMode::DepthFirst,
            pruning: PruningRules {
                enabled: true,
                confidence_threshold: 0.5,
                max_branches: 50,
                early_termination: context.user_preferences.accuracy_vs_speed < 0.5,
                redundancy_elimination: true,
            },
        },
    ];
    if context.system_resources.available_cpu > 2 {
        candidates.push(QueryStrategy {
            primary: PrimaryStrategy::HybridParallel,
            fallback: Some(FallbackStrategy::VectorOnly),
            reasoning: ReasoningMode::Bidirectional,
            pruning: PruningRules {
                enabled: true,
                confidence_threshold: 0.4,
                max_branches: 200,
                early_termination: false,
                redundancy_elimination: true,
            },
        });
    }
    candidates
}

/// Proposes candidate strategies for a reasoning query.
///
/// When no generation rule fires, the baseline candidate is returned so the
/// selector always has something to choose from.
pub fn reasoning_candidates(
    query: &ReasoningQuery,
    analysis: &QueryAnalysis,
) -> Vec<QueryStrategy> {
    let mut candidates = Vec::new();
    if query.reasoning_type == ReasoningType::Exploratory {
        candidates.push(QueryStrategy {
            primary: PrimaryStrategy::GraphFirst,
            fallback: None,
            reasoning: ReasoningMode::BreadthFirst,
            pruning: PruningRules::default(),
        });
    }
    if query
        .target_entities
        .as_ref()
        .is_some_and(|targets| !targets.is_empty())
    {
        candidates.push(QueryStrategy {
            primary: PrimaryStrategy::GraphFirst,
            fallback: None,
            reasoning: ReasoningMode::Bidirectional,
            pruning: PruningRules::default(),
        });
    }
    if analysis.complexity > 50 {
        candidates.push(QueryStrategy {
            primary: PrimaryStrategy::Adaptive,
            fallback: None,
            reasoning: ReasoningMode::Heuristic,
            pruning: PruningRules::default(),
        });
    }
    if candidates.is_empty() {
        candidates.push(baseline());
    }
    candidates
}

/// Scores one candidate against the context.
pub fn score_candidate(candidate: &QueryStrategy, context: &OptimizationContext) -> i32 {
    let mut score = 0;
    if candidate.primary == PrimaryStrategy::HybridParallel
        && context.system_resources.available_cpu > 2
    {
        score += 20;
    }
    if context.user_preferences.accuracy_vs_speed > 0.7 && !candidate.pruning.early_termination {
        score += 15;
    }
    if context.graph_size.node_count > 100_000 && candidate.pruning.enabled {
        score += 10;
    }
    score
}

/// Picks the highest-scoring candidate.
///
/// Ties (including the all-zero case) resolve to the earliest candidate in
/// generation order; this is a defined tie-break, not an accident of
/// iteration. An empty candidate list falls back to the baseline strategy.
pub fn select_strategy(
    candidates: &[QueryStrategy],
    context: &OptimizationContext,
) -> QueryStrategy {
    let Some(first) = candidates.first() else {
        warn!("no strategy candidates generated, falling back to baseline");
        return baseline();
    };
    let mut best = *first;
    let mut best_score = score_candidate(first, context);
    for candidate in &candidates[1..] {
        let score = score_candidate(candidate, context);
        if score > best_score {
            best = *candidate;
            best_score = score;
        }
    }
    best
}
