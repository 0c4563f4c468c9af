use std::io;
use thiserror::Error;

/// Convenience alias for fallible optimizer operations.
pub type Result<T> = std::result::Result<T, NoctuaError>;

/// Errors surfaced by the optimizer core and its collaborators.
#[derive(Debug, Error)]
pub enum NoctuaError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Failure while querying the graph catalog.
    #[error("catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),
    /// Failure while (de)serializing queries, plans, or snapshots.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Caller supplied an argument the optimizer cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The injected executor reported a failure; propagated unchanged.
    #[error("executor error: {0}")]
    Executor(String),
}

impl From<serde_json::Error> for NoctuaError {
    fn from(err: serde_json::Error) -> Self {
        NoctuaError::Serialization(err.to_string())
    }
}
