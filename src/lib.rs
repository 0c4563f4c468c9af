//! Noctua knowledge-graph platform: query optimizer core.
//!
//! Turns raw search and multi-hop reasoning requests into cost-estimated,
//! cacheable, parallelizable execution plans, runs them through an injected
//! engine callback, and feeds observed performance back into future planning.

#![warn(missing_docs)]

pub mod catalog;
pub mod context;
pub mod error;
pub mod optimizer;
pub mod query;

pub use error::{NoctuaError, Result};
pub use optimizer::{PlanExecutor, QueryOptimizer};
