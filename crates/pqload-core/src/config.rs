//! Loader configuration that downstream crates can serialize/deserialize.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Parquet file to load.
    pub file: PathBuf,

    /// Contact points, `host[:port]`.
    pub seeds: Vec<String>,
    pub keyspace: String,
    pub table: String,

    /// Preferred datacenter; empty means no preference.
    pub datacenter: String,
    pub username: String,
    pub password: String,

    /// Number of parallel write workers.
    pub workers: usize,

    /// Capacity of the queue between the reader and the workers.
    pub max_in_flight: usize,

    /// Rows admitted per second.
    pub rate_limit: u32,

    /// Rows decoded per read call.
    pub chunk_size: usize,

    /// Connections per host.
    pub connections: usize,

    /// Re-attempts per failed write, handled by the destination adapter.
    pub retries: usize,

    /// Per-request timeout.
    pub timeout_ms: u64,

    /// Emit a progress line every `sample` rows.
    pub sample: u64,

    /// Snappy-compress CQL frames.
    pub compress: bool,

    pub debug: bool,

    /// Reject type pairs that cannot be checked instead of skipping them.
    pub strict_types: bool,
}

/// Snapshot of the destination settings, consumed by the CQL adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub seeds: Vec<String>,
    pub keyspace: String,
    pub table: String,
    pub datacenter: Option<String>,
    pub username: String,
    pub password: String,
    pub connections_per_host: usize,
    pub retries: usize,
    pub timeout: Duration,
    pub compress: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            seeds: Vec::new(),
            keyspace: String::new(),
            table: String::new(),
            datacenter: String::new(),
            username: "cassandra".to_string(),
            password: "cassandra".to_string(),
            workers: 100,
            max_in_flight: 200,
            rate_limit: 10_000,
            chunk_size: 100,
            connections: 20,
            retries: 5,
            timeout_ms: 5_000,
            sample: 10_000,
            compress: false,
            debug: false,
            strict_types: false,
        }
    }
}

impl LoaderConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables (unparsable values are ignored):
    /// - `PQLOAD_FILE`, `PQLOAD_SEEDS` (comma separated), `PQLOAD_KEYSPACE`, `PQLOAD_TABLE`
    /// - `PQLOAD_DATACENTER`, `PQLOAD_USERNAME`, `PQLOAD_PASSWORD`
    /// - `PQLOAD_WORKERS`, `PQLOAD_MAX_IN_FLIGHT`, `PQLOAD_RATE_LIMIT`, `PQLOAD_CHUNK_SIZE`
    /// - `PQLOAD_CONNECTIONS`, `PQLOAD_RETRIES`, `PQLOAD_TIMEOUT_MS`, `PQLOAD_SAMPLE`
    /// - `PQLOAD_COMPRESS`, `PQLOAD_DEBUG`, `PQLOAD_STRICT_TYPES` (`1`/`true`/`yes`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LoaderConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(s) = lookup("PQLOAD_FILE") {
            cfg.file = PathBuf::from(s);
        }

        if let Some(s) = lookup("PQLOAD_SEEDS") {
            cfg.seeds = split_seeds(&s);
        }

        if let Some(s) = lookup("PQLOAD_KEYSPACE") {
            cfg.keyspace = s;
        }

        if let Some(s) = lookup("PQLOAD_TABLE") {
            cfg.table = s;
        }

        if let Some(s) = lookup("PQLOAD_DATACENTER") {
            cfg.datacenter = s;
        }

        if let Some(s) = lookup("PQLOAD_USERNAME") {
            cfg.username = s;
        }

        if let Some(s) = lookup("PQLOAD_PASSWORD") {
            cfg.password = s;
        }

        if let Some(v) = lookup("PQLOAD_WORKERS").and_then(|s| s.parse().ok()) {
            cfg.workers = v;
        }

        if let Some(v) = lookup("PQLOAD_MAX_IN_FLIGHT").and_then(|s| s.parse().ok()) {
            cfg.max_in_flight = v;
        }

        if let Some(v) = lookup("PQLOAD_RATE_LIMIT").and_then(|s| s.parse().ok()) {
            cfg.rate_limit = v;
        }

        if let Some(v) = lookup("PQLOAD_CHUNK_SIZE").and_then(|s| s.parse().ok()) {
            cfg.chunk_size = v;
        }

        if let Some(v) = lookup("PQLOAD_CONNECTIONS").and_then(|s| s.parse().ok()) {
            cfg.connections = v;
        }

        if let Some(v) = lookup("PQLOAD_RETRIES").and_then(|s| s.parse().ok()) {
            cfg.retries = v;
        }

        if let Some(v) = lookup("PQLOAD_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            cfg.timeout_ms = v;
        }

        if let Some(v) = lookup("PQLOAD_SAMPLE").and_then(|s| s.parse().ok()) {
            cfg.sample = v;
        }

        if let Some(v) = lookup("PQLOAD_COMPRESS").and_then(|s| parse_flag(&s)) {
            cfg.compress = v;
        }

        if let Some(v) = lookup("PQLOAD_DEBUG").and_then(|s| parse_flag(&s)) {
            cfg.debug = v;
        }

        if let Some(v) = lookup("PQLOAD_STRICT_TYPES").and_then(|s| parse_flag(&s)) {
            cfg.strict_types = v;
        }

        cfg
    }

    /// Check that every required setting is present and every bound is non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.file.as_os_str().is_empty() {
            return Err(Error::Config("missing parquet file".into()));
        }
        if self.seeds.is_empty() {
            return Err(Error::Config("missing cassandra seeds".into()));
        }
        if self.keyspace.is_empty() {
            return Err(Error::Config("missing keyspace".into()));
        }
        if self.table.is_empty() {
            return Err(Error::Config("missing table".into()));
        }

        let bounds = [
            ("workers", self.workers as u64),
            ("maxinflight", self.max_in_flight as u64),
            ("ratelimit", u64::from(self.rate_limit)),
            ("chunksize", self.chunk_size as u64),
            ("connections", self.connections as u64),
            ("sample", self.sample),
        ];
        for (name, value) in bounds {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Produce the destination configuration snapshot used by the IO layer.
    pub fn destination_config(&self) -> DestinationConfig {
        let datacenter = Some(self.datacenter.trim())
            .filter(|dc| !dc.is_empty())
            .map(str::to_string);

        DestinationConfig {
            seeds: self.seeds.clone(),
            keyspace: self.keyspace.clone(),
            table: self.table.clone(),
            datacenter,
            username: self.username.clone(),
            password: self.password.clone(),
            connections_per_host: self.connections,
            retries: self.retries,
            timeout: self.timeout(),
            compress: self.compress,
        }
    }
}

/// Split a comma-separated seed list, dropping blanks.
pub fn split_seeds(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
