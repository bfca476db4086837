//! pqload CLI: load one Parquet file into one Cassandra/ScyllaDB table.
//!
//! Settings come from `PQLOAD_*` environment variables first, then from
//! flags. The final report goes to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pqload_core::config::split_seeds;
use pqload_core::LoaderConfig;
use pqload_exec::Loader;
use pqload_io::{CassandraDestination, ParquetSource};

#[derive(Parser, Debug)]
#[command(name = "pqload")]
#[command(about = "Bulk-load a Parquet file into a Cassandra/ScyllaDB table", long_about = None)]
struct Cli {
    /// Parquet file to load
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Cluster contact points, comma separated
    #[arg(short = 's', long)]
    seeds: Option<String>,

    /// Destination keyspace
    #[arg(short = 'k', long)]
    keyspace: Option<String>,

    /// Destination table
    #[arg(short = 't', long)]
    table: Option<String>,

    /// Preferred datacenter for token-aware routing [default: none]
    #[arg(short = 'r', long)]
    datacenter: Option<String>,

    /// [default: cassandra]
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// [default: cassandra]
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Parallel write workers [default: 100]
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Rows buffered between reader and workers [default: 200]
    #[arg(short = 'i', long = "maxinflight")]
    max_in_flight: Option<usize>,

    /// Rows admitted per second [default: 10000]
    #[arg(short = 'l', long = "ratelimit")]
    rate_limit: Option<u32>,

    /// Rows decoded per read [default: 100]
    #[arg(short = 'c', long = "chunksize")]
    chunk_size: Option<usize>,

    /// Connections per host [default: 20]
    #[arg(long)]
    connections: Option<usize>,

    /// Re-attempts per failed write [default: 5]
    #[arg(long)]
    retries: Option<usize>,

    /// Request timeout in milliseconds [default: 5000]
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// Log progress every N rows (with --debug) [default: 10000]
    #[arg(long)]
    sample: Option<u64>,

    /// Snappy-compress CQL frames
    #[arg(long)]
    compress: bool,

    /// Verbose diagnostics
    #[arg(long)]
    debug: bool,

    /// Fail on column type pairs that cannot be checked
    #[arg(long = "strict-types")]
    strict_types: bool,
}

impl Cli {
    /// Layer flags over `cfg`; a flag that was not given keeps the env value.
    fn apply(self, cfg: &mut LoaderConfig) {
        if let Some(file) = self.file {
            cfg.file = file;
        }
        if let Some(seeds) = self.seeds {
            cfg.seeds = split_seeds(&seeds);
        }
        if let Some(keyspace) = self.keyspace {
            cfg.keyspace = keyspace;
        }
        if let Some(table) = self.table {
            cfg.table = table;
        }
        if let Some(dc) = self.datacenter {
            cfg.datacenter = dc;
        }
        if let Some(user) = self.username {
            cfg.username = user;
        }
        if let Some(password) = self.password {
            cfg.password = password;
        }
        if let Some(n) = self.workers {
            cfg.workers = n;
        }
        if let Some(n) = self.max_in_flight {
            cfg.max_in_flight = n;
        }
        if let Some(n) = self.rate_limit {
            cfg.rate_limit = n;
        }
        if let Some(n) = self.chunk_size {
            cfg.chunk_size = n;
        }
        if let Some(n) = self.connections {
            cfg.connections = n;
        }
        if let Some(n) = self.retries {
            cfg.retries = n;
        }
        if let Some(ms) = self.timeout_ms {
            cfg.timeout_ms = ms;
        }
        if let Some(n) = self.sample {
            cfg.sample = n;
        }
        cfg.compress |= self.compress;
        cfg.debug |= self.debug;
        cfg.strict_types |= self.strict_types;
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = parse_exit_code(&e);
            // Help and version go to stdout; usage errors go to stderr.
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let mut config = LoaderConfig::from_env();
    cli.apply(&mut config);

    init_tracing(config.debug);

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `--help` and `--version` succeed; every other parse failure is a setup
/// error and exits 1 like the rest of them.
fn parse_exit_code(e: &clap::Error) -> i32 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn run(config: &LoaderConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    tracing::debug!(
        file = %config.file.display(),
        keyspace = %config.keyspace,
        table = %config.table,
        "starting load"
    );
    let source = ParquetSource::open(&config.file)?;

    let destination = CassandraDestination::connect(&config.destination_config())?;

    let mut loader = Loader::from_config(config)?;
    let stats = loader.run(&source, &destination)?;

    println!("{}", stats.report_line());
    Ok(())
}
