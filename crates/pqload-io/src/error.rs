use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("parquet: {0}")]
    Parquet(String),

    #[error("row group {index} out of range ({count} row groups)")]
    RowGroupOutOfRange { index: usize, count: usize },

    #[error("row has {actual} cells, expected {expected}")]
    RowWidth { expected: usize, actual: usize },

    #[error("session: {0}")]
    Session(String),

    #[error("schema query: {0}")]
    SchemaQuery(String),

    #[error("table {keyspace}.{table} not found or has no columns")]
    TableNotFound { keyspace: String, table: String },

    #[error("prepare: {0}")]
    Prepare(String),

    #[error("write: {0}")]
    Write(String),

    #[error("config: {0}")]
    Config(String),
}

#[cfg(feature = "parquet")]
impl From<parquet::errors::ParquetError> for Error {
    fn from(e: parquet::errors::ParquetError) -> Self {
        Error::Parquet(e.to_string())
    }
}
