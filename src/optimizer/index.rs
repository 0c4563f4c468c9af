//! Storage index recommendations.

use serde::{Deserialize, Serialize};

use crate::context::GraphSizeMetrics;

/// Graphs below this node count traverse fast enough without extra indexes.
const RECOMMENDATION_THRESHOLD: u64 = 10_000;

/// How urgently a recommended index should be built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    /// Build when convenient.
    Low,
    /// Build during the next maintenance window.
    Medium,
    /// Build as soon as possible.
    High,
}

/// Kind of storage index being recommended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Ordered B-tree index.
    BTree,
    /// HNSW approximate-nearest-neighbor index.
    Hnsw,
    /// Hash lookup index.
    Hash,
}

/// One proposed storage index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexRecommendation {
    /// Index structure to build.
    pub kind: IndexKind,
    /// Table the index covers.
    pub table: String,
    /// Indexed columns, in key order.
    pub columns: Vec<String>,
    /// Build urgency.
    pub priority: RecommendationPriority,
    /// Expected traversal speedup, in percent.
    pub estimated_improvement_pct: f64,
    /// Expected on-disk size, in MiB.
    pub estimated_size_mb: u64,
    /// Abstract write-amplification cost of maintaining the index.
    pub maintenance_cost: f64,
}

/// Proposes indexes worth building for the current graph size.
///
/// Small graphs get nothing; past the threshold the relationship table gets a
/// composite B-tree so confidence-filtered traversals stop scanning.
pub fn recommend_indexes(graph: &GraphSizeMetrics) -> Vec<IndexRecommendation> {
    if graph.node_count <= RECOMMENDATION_THRESHOLD {
        return Vec::new();
    }
    vec![IndexRecommendation {
        kind: IndexKind::BTree,
        table: "relationships".into(),
        columns: vec!["source_entity_id".into(), "confidence".into()],
        priority: RecommendationPriority::High,
        estimated_improvement_pct: 50.0,
        estimated_size_mb: 100,
        maintenance_cost: 5.0,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(node_count: u64) -> GraphSizeMetrics {
        GraphSizeMetrics {
            node_count,
            relationship_count: node_count * 2,
            avg_degree: 4.0,
            max_degree: 100,
            clustering_coefficient: 0.3,
            diameter: 6,
        }
    }

    #[test]
    fn small_graphs_get_no_recommendations() {
        assert!(recommend_indexes(&graph(9_999)).is_empty());
        assert!(recommend_indexes(&graph(10_000)).is_empty());
    }

    #[test]
    fn large_graphs_get_the_relationship_btree() {
        let recs = recommend_indexes(&graph(10_001));
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.kind, IndexKind::BTree);
        assert_eq!(rec.table, "relationships");
        assert_eq!(rec.columns, vec!["source_entity_id", "confidence"]);
        assert_eq!(rec.priority, RecommendationPriority::High);
        assert_eq!(rec.estimated_improvement_pct, 50.0);
        assert_eq!(rec.estimated_size_mb, 100);
        assert_eq!(rec.maintenance_cost, 5.0);
    }
}
