//! File readers implementing [`crate::source::RowSource`].

#[cfg(feature = "parquet")]
pub mod parquet;
