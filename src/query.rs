//! Search and reasoning query value objects.
//!
//! These are the opaque inputs the optimizer plans for. They carry exactly the
//! fields planning decisions depend on; the search/reasoning engines own any
//! richer representation.

use serde::{Deserialize, Serialize};

/// A vector/graph hybrid search request against the knowledge base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query the vector engine embeds.
    pub text: String,
    /// Structural filters narrowing the candidate set.
    #[serde(default)]
    pub filters: SearchFilters,
    /// Execution options supplied by the caller.
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchQuery {
    /// Creates a search query for `text` with no filters or options.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: SearchFilters::default(),
            options: SearchOptions::default(),
        }
    }
}

/// Filters applied to search candidates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Restrict results to these entity types.
    pub entity_types: Option<Vec<String>>,
    /// Restrict traversals to these relationship types.
    pub relationship_types: Option<Vec<String>>,
    /// Drop results below this confidence.
    pub min_confidence: Option<f64>,
}

/// Per-call search options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum graph hops to expand from vector hits.
    pub max_hops: Option<u32>,
    /// Maximum number of results to return.
    pub max_results: Option<u64>,
    /// Whether the caller wants a reasoning explanation attached.
    #[serde(default)]
    pub include_explanation: bool,
}

/// A multi-hop reasoning request over the knowledge graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReasoningQuery {
    /// Entities the traversal starts from.
    pub start_entities: Vec<String>,
    /// Entities the traversal should reach, when known.
    pub target_entities: Option<Vec<String>>,
    /// Maximum traversal depth.
    pub max_depth: u32,
    /// Minimum confidence for traversed relationships.
    pub min_confidence: f64,
    /// The kind of reasoning requested.
    pub reasoning_type: ReasoningType,
}

/// High-level intent of a reasoning query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningType {
    /// Open-ended neighborhood exploration from the start entities.
    Exploratory,
    /// Derive conclusions along typed relationship chains.
    Deductive,
    /// Trace cause/effect chains between entities.
    Causal,
}

/// Either kind of query, as referenced from a plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceQuery {
    /// A hybrid search request.
    Search(SearchQuery),
    /// A multi-hop reasoning request.
    Reasoning(ReasoningQuery),
}
