#![forbid(unsafe_code)]
//! pqload: bulk-load Parquet files into Cassandra/ScyllaDB tables.
//!
//! Facade over the workspace crates:
//! - `pqload-core`: data model, schema validation, configuration.
//! - `pqload-io`: Parquet source and CQL destination adapters, plus in-memory fakes.
//! - `pqload-exec`: rate-limited producer, bounded queue, worker pool, orchestrator.

pub use pqload_core::{validate_schema, Cell, ColumnMeta, FieldDescriptor, LoaderConfig, SemanticType, Value};
pub use pqload_exec::{LoadError, LoadOptions, Loader, RunStats};
pub use pqload_io::{Destination, MemorySink, MemorySource, PreparedInsert, RowSource};

#[cfg(feature = "parquet")]
pub use pqload_io::ParquetSource;

#[cfg(feature = "cassandra")]
pub use pqload_io::CassandraDestination;
