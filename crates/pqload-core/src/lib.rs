#![forbid(unsafe_code)]
//! pqload-core: data model, schema validation, and configuration.
//!
//! Everything here is pure data plus the schema validator. Reading Parquet
//! files and talking to the destination cluster live in `pqload-io`; the
//! queue, worker pool, and orchestrator live in `pqload-exec`.

pub mod config;
pub mod error;
pub mod schema;
pub mod types;
pub mod validate;

pub use config::{DestinationConfig, LoaderConfig};
pub use error::{Error, Result};
pub use schema::{ColumnMapping, ColumnMeta, FieldDescriptor, InsertTemplate, SemanticType};
pub use types::{Cell, Row, Value};
pub use validate::{validate_schema, ValidationOutcome};
