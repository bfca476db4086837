//! Run counters.
//!
//! All shared counters are plain atomics; the pipeline holds no locks.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Failed writes across all workers. Only ever goes up.
#[derive(Debug, Default)]
pub struct ErrorTally {
    failed: AtomicU64,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// High-water mark of a gauge, updated lock-free.
#[derive(Debug, Default)]
pub struct PeakGauge {
    peak: AtomicUsize,
}

impl PeakGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation; keeps the maximum seen so far.
    pub fn record(&self, value: usize) {
        let mut cur = self.peak.load(Ordering::Relaxed);
        while value > cur {
            match self
                .peak
                .compare_exchange(cur, value, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}

/// Statistics of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub rows_emitted: u64,
    pub successful_writes: u64,
    pub error_count: u64,
    /// Cells of an unsupported kind, written as unset.
    pub skipped_cells: u64,
    /// Most rows ever buffered in the queue at once.
    pub peak_queued: usize,
    pub elapsed: Duration,
}

impl RunStats {
    /// Whole rows per second; 0 when no time elapsed.
    pub fn rows_per_sec(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.rows_emitted as f64 / secs) as u64
        } else {
            0
        }
    }

    pub fn report_line(&self) -> String {
        format!(
            "{} rows inserted in {:?}. ({} rows/s). {} failed",
            self.rows_emitted,
            self.elapsed,
            self.rows_per_sec(),
            self.error_count
        )
    }
}
