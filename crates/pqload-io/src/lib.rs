#![forbid(unsafe_code)]
//! pqload-io: the two collaborators of the ingestion pipeline.
//!
//! - [`source`]: `RowSource` / `RowGroupCursor`, implemented by the Parquet
//!   reader and by [`MemorySource`].
//! - [`sinks`]: `Destination` / `PreparedInsert`, implemented by the CQL
//!   adapter (feature `cassandra`) and by [`MemorySink`].

pub mod error;
pub mod memory_sink;
pub mod memory_source;
pub mod readers;
pub mod sinks;
pub mod source;

pub use error::{Error, Result};
pub use memory_sink::MemorySink;
pub use memory_source::MemorySource;
pub use sinks::{Destination, PreparedInsert};
pub use source::{ChunkStatus, RowGroupCursor, RowSource};

#[cfg(feature = "parquet")]
pub use readers::parquet::ParquetSource;

#[cfg(feature = "cassandra")]
pub use sinks::cassandra::CassandraDestination;
