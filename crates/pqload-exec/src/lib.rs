#![forbid(unsafe_code)]
//! pqload-exec: the ingestion pipeline.
//!
//! One producer (the caller's thread) walks the source row groups in order,
//! converts cells into values, waits on the rate limiter and pushes rows
//! into a bounded queue. A fixed pool of worker threads drains the queue
//! into the prepared insert and tallies failures. [`Loader`] runs the whole
//! thing once and returns [`RunStats`].

pub mod error;
pub mod metrics;
pub mod producer;
pub mod rate;
pub mod runtime;
pub mod scheduler;

pub use error::{LoadError, Result};
pub use metrics::{ErrorTally, RunStats};
pub use runtime::{LoadOptions, Loader, Phase};
