//! Orchestrator: wire source, validator, producer, queue and pool for one run.
//!
//! Phases only move forward:
//! `Init → SchemaValidated → Streaming → Draining → Done`.
//! Anything that fails before `Streaming` aborts the run with no rows
//! written. A read failure during `Streaming` still closes the queue and
//! joins the workers before the error is returned.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use pqload_core::{validate_schema, LoaderConfig, Row, ValidationOutcome};
use pqload_io::{Destination, PreparedInsert, RowSource};

use crate::error::{LoadError, Result};
use crate::metrics::{ErrorTally, RunStats};
use crate::producer::{ProducerStats, RowProducer};
use crate::rate::RateLimiter;
use crate::scheduler::{BoundedQueue, WorkerPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Init,
    SchemaValidated,
    Streaming,
    Draining,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::SchemaValidated => "schema-validated",
            Phase::Streaming => "streaming",
            Phase::Draining => "draining",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// The subset of [`LoaderConfig`] the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub keyspace: String,
    pub table: String,
    pub workers: usize,
    pub max_in_flight: usize,
    pub rate_limit: u32,
    pub chunk_size: usize,
    pub sample: u64,
    pub strict_types: bool,
}

impl From<&LoaderConfig> for LoadOptions {
    fn from(cfg: &LoaderConfig) -> Self {
        Self {
            keyspace: cfg.keyspace.clone(),
            table: cfg.table.clone(),
            workers: cfg.workers,
            max_in_flight: cfg.max_in_flight,
            rate_limit: cfg.rate_limit,
            chunk_size: cfg.chunk_size,
            sample: cfg.sample,
            strict_types: cfg.strict_types,
        }
    }
}

impl LoadOptions {
    fn check(&self) -> Result<()> {
        let bounds = [
            ("workers", self.workers as u64),
            ("maxinflight", self.max_in_flight as u64),
            ("ratelimit", u64::from(self.rate_limit)),
            ("chunksize", self.chunk_size as u64),
            ("sample", self.sample),
        ];
        match bounds.iter().find(|(_, v)| *v == 0) {
            Some((name, _)) => Err(LoadError::Config(format!(
                "{name} must be greater than zero"
            ))),
            None => Ok(()),
        }
    }
}

/// Runs one load. A loader cannot be reused.
pub struct Loader {
    opts: LoadOptions,
    phase: Phase,
}

impl Loader {
    pub fn new(opts: LoadOptions) -> Result<Self> {
        opts.check()?;
        Ok(Self {
            opts,
            phase: Phase::Init,
        })
    }

    pub fn from_config(cfg: &LoaderConfig) -> Result<Self> {
        Self::new(LoadOptions::from(cfg))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> &LoadOptions {
        &self.opts
    }

    /// Load every row of `source` into `destination`.
    pub fn run(
        &mut self,
        source: &dyn RowSource,
        destination: &dyn Destination,
    ) -> Result<RunStats> {
        if self.phase != Phase::Init {
            return Err(LoadError::AlreadyRan(self.phase.to_string()));
        }

        let (outcome, insert) = self.validate(source, destination)?;
        advance(&mut self.phase, Phase::SchemaValidated);

        let limiter = RateLimiter::per_second(self.opts.rate_limit)?;
        let tally = ErrorTally::new();
        let started = Instant::now();
        advance(&mut self.phase, Phase::Streaming);

        let opts = &self.opts;
        let phase = &mut self.phase;
        let (produced, successes, peak_queued) = thread::scope(|s| -> Result<_> {
            let (tx, rx) = BoundedQueue::<Row>::with_capacity(opts.max_in_flight).split();
            let pool = WorkerPool::spawn(s, opts.workers, rx, insert, &tally)?;

            let producer = RowProducer::new(source, &limiter, opts.chunk_size, opts.sample);
            let produced = producer.run(&tx);

            let peak_queued = tx.close();
            advance(phase, Phase::Draining);

            let successes = pool.join();
            Ok((produced?, successes?, peak_queued))
        })?;

        let ProducerStats {
            rows_emitted,
            skipped_cells,
        } = produced;

        let stats = RunStats {
            rows_emitted,
            successful_writes: successes,
            error_count: tally.get(),
            skipped_cells,
            peak_queued,
            elapsed: started.elapsed(),
        };
        advance(&mut self.phase, Phase::Done);

        if !outcome.unchecked.is_empty() {
            tracing::warn!(
                columns = outcome.unchecked.len(),
                "some columns were loaded without a type check"
            );
        }
        if skipped_cells > 0 {
            tracing::warn!(skipped_cells, "cells of unsupported kinds were left unset");
        }
        tracing::info!(
            rows = stats.rows_emitted,
            failed = stats.error_count,
            rows_per_sec = stats.rows_per_sec(),
            peak_queued = stats.peak_queued,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "load finished"
        );

        Ok(stats)
    }

    fn validate(
        &self,
        source: &dyn RowSource,
        destination: &dyn Destination,
    ) -> Result<(ValidationOutcome, Arc<dyn PreparedInsert>)> {
        let fields = source.fields();
        for field in fields {
            tracing::debug!(
                field = %field.name,
                semantic_type = %field.semantic_type,
                "source field"
            );
        }

        let columns = destination.describe_table(&self.opts.keyspace, &self.opts.table)?;
        let outcome = validate_schema(
            &self.opts.keyspace,
            &self.opts.table,
            fields,
            &columns,
            self.opts.strict_types,
        )?;
        tracing::debug!(statement = %outcome.template.statement, "insert statement");

        let insert = destination.prepare(&outcome.template)?;
        Ok((outcome, insert))
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug_assert!(next > *phase, "phase {phase} cannot move to {next}");
    tracing::debug!(from = %phase, to = %next, "phase");
    *phase = next;
}
