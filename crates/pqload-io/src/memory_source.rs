//! In-memory row source for tests and benches.
//!
//! Holds a field list and a vector of row groups, each a vector of rows of
//! [`Cell`]s. An optional injected failure makes one row group error out
//! after a given number of rows.

use pqload_core::{Cell, FieldDescriptor};

use crate::error::{Error, Result};
use crate::source::{ChunkStatus, RowGroupCursor, RowSource};

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fields: Vec<FieldDescriptor>,
    groups: Vec<Vec<Vec<Cell>>>,
    fail_at: Option<(usize, usize)>,
}

impl MemorySource {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            groups: Vec::new(),
            fail_at: None,
        }
    }

    /// Append one row group.
    pub fn with_row_group(mut self, rows: Vec<Vec<Cell>>) -> Self {
        self.groups.push(rows);
        self
    }

    /// Split `rows` into groups of at most `group_size` rows.
    pub fn with_rows(mut self, rows: Vec<Vec<Cell>>, group_size: usize) -> Self {
        let group_size = group_size.max(1);
        let mut rows = rows.into_iter().peekable();
        while rows.peek().is_some() {
            self.groups.push(rows.by_ref().take(group_size).collect());
        }
        self
    }

    /// Make row group `group` fail with a decode error once `after_rows` rows
    /// have been read from it.
    pub fn fail_in_group(mut self, group: usize, after_rows: usize) -> Self {
        self.fail_at = Some((group, after_rows));
        self
    }

    pub fn total_rows(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

impl RowSource for MemorySource {
    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn num_row_groups(&self) -> usize {
        self.groups.len()
    }

    fn num_rows(&self) -> Option<u64> {
        Some(self.total_rows() as u64)
    }

    fn open_row_group(&self, index: usize) -> Result<Box<dyn RowGroupCursor + '_>> {
        let rows = self.groups.get(index).ok_or(Error::RowGroupOutOfRange {
            index,
            count: self.groups.len(),
        })?;
        let fail_after = match self.fail_at {
            Some((g, after)) if g == index => Some(after),
            _ => None,
        };
        Ok(Box::new(MemoryCursor {
            rows,
            pos: 0,
            fail_after,
        }))
    }
}

struct MemoryCursor<'a> {
    rows: &'a [Vec<Cell>],
    pos: usize,
    fail_after: Option<usize>,
}

impl RowGroupCursor for MemoryCursor<'_> {
    fn read_chunk(&mut self, max_rows: usize, out: &mut Vec<Vec<Cell>>) -> Result<ChunkStatus> {
        let mut end = (self.pos + max_rows).min(self.rows.len());
        if let Some(limit) = self.fail_after {
            if self.pos >= limit {
                return Err(Error::Parquet(format!(
                    "injected decode failure at row {}",
                    self.pos
                )));
            }
            end = end.min(limit);
        }

        out.extend_from_slice(&self.rows[self.pos..end]);
        let rows = end - self.pos;
        self.pos = end;

        // A limit that is never reached must not hide the end of the group.
        let limit_pending = self.fail_after.map_or(true, |limit| end < limit);
        Ok(ChunkStatus {
            rows,
            end_of_stream: rows < max_rows && limit_pending,
        })
    }
}
