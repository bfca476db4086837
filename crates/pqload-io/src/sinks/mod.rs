//! Destination-side contract.
//!
//! - `cassandra`: CQL cluster via the scylla driver (feature `cassandra`).
//! - [`crate::MemorySink`]: in-memory recorder for tests.

#[cfg(feature = "cassandra")]
pub mod cassandra;

use std::sync::Arc;

use pqload_core::{ColumnMeta, InsertTemplate, Value};

use crate::error::Result;

/// A destination table store.
///
/// Shared by the orchestrator and, through [`PreparedInsert`], by every
/// worker thread.
pub trait Destination: Send + Sync {
    /// Column names and CQL types of `keyspace.table`, in any order.
    fn describe_table(&self, keyspace: &str, table: &str) -> Result<Vec<ColumnMeta>>;

    fn prepare(&self, template: &InsertTemplate) -> Result<Arc<dyn PreparedInsert>>;
}

/// A prepared insert, safe to execute from many threads at once.
pub trait PreparedInsert: Send + Sync {
    /// Bind `values` positionally and write one row. `Value::Unset` leaves
    /// the column untouched.
    fn execute(&self, values: &[Value]) -> Result<()>;
}
