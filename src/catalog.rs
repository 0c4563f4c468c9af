//! Graph catalog access for context assembly.
//!
//! The optimizer only needs two numbers from the store: how many nodes and how
//! many relationships the graph currently holds. The trait keeps the optimizer
//! decoupled from the storage layer; the SQLite implementation runs the two
//! count queries against the platform's tables.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::Result;

/// Provides node and relationship counts for optimization-context assembly.
pub trait GraphCatalog: Send + Sync {
    /// Total number of nodes in the graph.
    fn node_count(&self) -> Result<u64>;
    /// Total number of relationships in the graph.
    fn relationship_count(&self) -> Result<u64>;
}

/// Catalog backed by the platform's SQLite database.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Opens the catalog at the given database path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open(path)?),
        })
    }

    /// Opens an in-memory catalog, mainly for tests and prototyping.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Runs arbitrary setup SQL (schema creation, fixture rows).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    fn count(&self, sql: &str) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl GraphCatalog for SqliteCatalog {
    fn node_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM nodes")
    }

    fn relationship_count(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM relationships")
    }
}

/// Fixed-size catalog used in tests or when no store is wired up yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedCatalog {
    nodes: u64,
    relationships: u64,
}

impl FixedCatalog {
    /// Creates a catalog reporting the given counts.
    pub fn new(nodes: u64, relationships: u64) -> Self {
        Self {
            nodes,
            relationships,
        }
    }
}

impl GraphCatalog for FixedCatalog {
    fn node_count(&self) -> Result<u64> {
        Ok(self.nodes)
    }

    fn relationship_count(&self) -> Result<u64> {
        Ok(self.relationships)
    }
}
