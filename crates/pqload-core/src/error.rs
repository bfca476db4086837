use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Setup-time failures. Every variant is fatal: the run never starts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("columns number not matching: source has {source_fields} fields, destination has {destination_columns} columns")]
    SchemaMismatch {
        source_fields: usize,
        destination_columns: usize,
    },

    #[error("column {column} invalid type: source {source_type}, destination {destination_type}")]
    TypeMismatch {
        column: String,
        source_type: String,
        destination_type: String,
    },

    #[error("column {0} not found in destination table")]
    MissingColumn(String),

    #[error("column {column} has unsupported type pair: source {source_type}, destination {destination_type}")]
    UnsupportedType {
        column: String,
        source_type: String,
        destination_type: String,
    },
}
