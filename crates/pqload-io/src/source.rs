//! Source-side contract: an ordered field list and row groups read in chunks.

use pqload_core::{Cell, FieldDescriptor};

use crate::error::Result;

/// Outcome of one chunked read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStatus {
    /// Rows appended to the output buffer by this call.
    pub rows: usize,
    /// The row group has no more rows. Not an error.
    pub end_of_stream: bool,
}

pub trait RowSource {
    /// Fields in file order.
    fn fields(&self) -> &[FieldDescriptor];

    fn num_row_groups(&self) -> usize;

    /// Total row count across all row groups, when the footer knows it.
    fn num_rows(&self) -> Option<u64> {
        None
    }

    fn open_row_group(&self, index: usize) -> Result<Box<dyn RowGroupCursor + '_>>;
}

pub trait RowGroupCursor {
    /// Append up to `max_rows` decoded rows to `out`.
    ///
    /// A call that returns fewer than `max_rows` rows, or zero rows, sets
    /// `end_of_stream`. Decode failures are returned as `Err`.
    fn read_chunk(&mut self, max_rows: usize, out: &mut Vec<Vec<Cell>>) -> Result<ChunkStatus>;
}
