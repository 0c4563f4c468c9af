//! Structural query analysis.
//!
//! The analyzer computes the features strategy generation keys off: a scalar
//! complexity score and an estimated result selectivity. It is deterministic
//! and has no side effects, so plan generation stays safe to call from any
//! number of threads.

use serde::{Deserialize, Serialize};

use crate::query::{ReasoningQuery, SearchQuery};

/// Structural features of a query, consumed by strategy generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Scalar complexity score; higher means more planning effort is justified.
    pub complexity: u32,
    /// Estimated fraction of the graph a query touches, floored at 0.001.
    pub selectivity: f64,
    /// Number of entity types constrained by the query.
    pub entity_type_count: usize,
    /// Number of relationship types constrained by the query.
    pub relationship_type_count: usize,
}

const SELECTIVITY_FLOOR: f64 = 0.001;

/// Analyzes a search query.
///
/// Complexity is `1 + |entity types| + |relationship types| + 2 * max_hops`,
/// plus 5 when an explanation is requested. Selectivity starts at 1.0 and
/// shrinks for each narrowing filter.
pub fn analyze_search(query: &SearchQuery) -> QueryAnalysis {
    let entity_type_count = query
        .filters
        .entity_types
        .as_ref()
        .map_or(0, |types| types.len());
    let relationship_type_count = query
        .filters
        .relationship_types
        .as_ref()
        .map_or(0, |types| types.len());
    let max_hops = query.options.max_hops.unwrap_or(0);

    let mut complexity = 1u32
        .saturating_add(entity_type_count as u32)
        .saturating_add(relationship_type_count as u32)
        .saturating_add(max_hops.saturating_mul(2));
    if query.options.include_explanation {
        complexity = complexity.saturating_add(5);
    }

    let mut selectivity = 1.0;
    if entity_type_count > 0 {
        selectivity *= 0.1;
    }
    if let Some(min_confidence) = query.filters.min_confidence {
        selectivity *= min_confidence;
    }

    QueryAnalysis {
        complexity,
        selectivity: selectivity.max(SELECTIVITY_FLOOR),
        entity_type_count,
        relationship_type_count,
    }
}

/// Analyzes a reasoning query.
///
/// Complexity scales with traversal depth and fan-out of start entities;
/// selectivity is a fixed estimate pending per-entity statistics.
pub fn analyze_reasoning(query: &ReasoningQuery) -> QueryAnalysis {
    let fanout = u32::try_from(query.start_entities.len()).unwrap_or(u32::MAX);
    QueryAnalysis {
        complexity: query.max_depth.saturating_mul(fanout),
        selectivity: 0.1,
        entity_type_count: query.start_entities.len(),
        relationship_type_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ReasoningType;

    #[test]
    fn bare_search_has_unit_complexity() {
        let analysis = analyze_search(&SearchQuery::new("ferris"));
        assert_eq!(analysis.complexity, 1);
        assert_eq!(analysis.selectivity, 1.0);
    }

    #[test]
    fn filters_and_options_add_complexity() {
        let mut query = SearchQuery::new("ferris");
        query.filters.entity_types = Some(vec!["Person".into(), "Company".into()]);
        query.filters.relationship_types = Some(vec!["WORKS_AT".into()]);
        query.options.max_hops = Some(3);
        query.options.include_explanation = true;
        let analysis = analyze_search(&query);
        // 1 + 2 + 1 + 2*3 + 5
        assert_eq!(analysis.complexity, 15);
        assert_eq!(analysis.entity_type_count, 2);
        assert_eq!(analysis.relationship_type_count, 1);
    }

    #[test]
    fn selectivity_shrinks_with_filters() {
        let mut query = SearchQuery::new("ferris");
        query.filters.entity_types = Some(vec!["Person".into()]);
        query.filters.min_confidence = Some(0.5);
        let analysis = analyze_search(&query);
        assert!((analysis.selectivity - 0.05).abs() < 1e-9);
    }

    #[test]
    fn selectivity_never_drops_below_floor() {
        let mut query = SearchQuery::new("ferris");
        query.filters.entity_types = Some(vec!["Person".into()]);
        query.filters.min_confidence = Some(0.0001);
        let analysis = analyze_search(&query);
        assert_eq!(analysis.selectivity, SELECTIVITY_FLOOR);
    }

    #[test]
    fn extreme_hop_counts_saturate_instead_of_overflowing() {
        let mut query = SearchQuery::new("ferris");
        query.options.max_hops = Some(u32::MAX);
        query.options.include_explanation = true;
        let analysis = analyze_search(&query);
        assert_eq!(analysis.complexity, u32::MAX);
    }

    #[test]
    fn extreme_reasoning_depth_saturates() {
        let query = ReasoningQuery {
            start_entities: vec!["a".into(), "b".into()],
            target_entities: None,
            max_depth: u32::MAX,
            min_confidence: 0.5,
            reasoning_type: ReasoningType::Exploratory,
        };
        let analysis = analyze_reasoning(&query);
        assert_eq!(analysis.complexity, u32::MAX);
    }

    #[test]
    fn reasoning_complexity_scales_with_depth_and_fanout() {
        let query = ReasoningQuery {
            start_entities: vec!["a".into(), "b".into(), "c".into()],
            target_entities: None,
            max_depth: 4,
            min_confidence: 0.5,
            reasoning_type: ReasoningType::Exploratory,
        };
        let analysis = analyze_reasoning(&query);
        assert_eq!(analysis.complexity, 12);
        assert_eq!(analysis.selectivity, 0.1);
    }
}
