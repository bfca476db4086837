//! Row producer: source row groups → typed rows → rate limiter → queue.

use pqload_core::{Cell, Row, Value};
use pqload_io::{Error as IoError, RowSource};

use crate::error::Result;
use crate::rate::RateLimiter;
use crate::scheduler::QueueProducer;

/// Counts reported by a finished producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub rows_emitted: u64,
    pub skipped_cells: u64,
}

pub struct RowProducer<'a> {
    source: &'a dyn RowSource,
    limiter: &'a RateLimiter,
    chunk_size: usize,
    sample: u64,
}

impl<'a> RowProducer<'a> {
    pub fn new(
        source: &'a dyn RowSource,
        limiter: &'a RateLimiter,
        chunk_size: usize,
        sample: u64,
    ) -> Self {
        Self {
            source,
            limiter,
            chunk_size: chunk_size.max(1),
            sample: sample.max(1),
        }
    }

    /// Stream every row group, in file order, into `queue`.
    ///
    /// Returns on the first read or decode failure; rows already queued stay
    /// queued.
    pub fn run(&self, queue: &QueueProducer<Row>) -> Result<ProducerStats> {
        let width = self.source.fields().len();
        let mut stats = ProducerStats::default();
        let mut chunk: Vec<Vec<Cell>> = Vec::with_capacity(self.chunk_size);

        for group in 0..self.source.num_row_groups() {
            let mut cursor = self.source.open_row_group(group)?;
            tracing::debug!(row_group = group, "reading row group");

            loop {
                chunk.clear();
                let status = cursor.read_chunk(self.chunk_size, &mut chunk)?;

                for cells in chunk.drain(..) {
                    if cells.len() != width {
                        return Err(IoError::RowWidth {
                            expected: width,
                            actual: cells.len(),
                        }
                        .into());
                    }
                    let row = convert_row(cells, &mut stats.skipped_cells);

                    self.limiter.acquire();
                    queue.push(row)?;
                    stats.rows_emitted += 1;

                    if stats.rows_emitted % self.sample == 0 {
                        tracing::debug!(
                            rows = stats.rows_emitted,
                            queued = queue.len(),
                            "progress"
                        );
                    }
                }

                if status.end_of_stream {
                    break;
                }
            }
        }

        Ok(stats)
    }
}

/// Convert one decoded row, counting cells that had to be left unset.
pub fn convert_row(cells: Vec<Cell>, skipped: &mut u64) -> Row {
    cells
        .into_iter()
        .map(|cell| {
            let converted = Value::from_cell(cell);
            if converted.is_skipped() {
                *skipped += 1;
            }
            converted.into_value()
        })
        .collect()
}
