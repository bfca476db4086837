//! CQL destination on the scylla driver (enabled with `--features cassandra`).
//!
//! The driver is async; the loader's workers are plain threads. The
//! destination owns a tokio runtime and every call blocks on it, so many
//! workers can drive requests concurrently through one shared session.

use std::num::NonZeroUsize;
use std::sync::Arc;

use scylla::frame::response::result::CqlValue;
use scylla::frame::value::MaybeUnset;
use scylla::load_balancing::DefaultPolicy;
use scylla::prepared_statement::PreparedStatement;
use scylla::query::Query;
use scylla::statement::Consistency;
use scylla::transport::session::PoolSize;
use scylla::transport::Compression;
use scylla::{ExecutionProfile, Session, SessionBuilder};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use pqload_core::{ColumnMeta, DestinationConfig, InsertTemplate, Value};

use crate::error::{Error, Result};
use crate::sinks::{Destination, PreparedInsert};

const DESCRIBE_COLUMNS: &str =
    "SELECT column_name, type FROM system_schema.columns WHERE keyspace_name = ? AND table_name = ?";

struct Shared {
    // Dropped before the runtime it was built on.
    session: Session,
    runtime: Runtime,
}

pub struct CassandraDestination {
    shared: Arc<Shared>,
    retries: usize,
}

impl CassandraDestination {
    /// Open a session against `cfg.seeds`.
    ///
    /// Writes go out at consistency ANY with token-aware routing, preferring
    /// `cfg.datacenter` when set.
    pub fn connect(cfg: &DestinationConfig) -> Result<Self> {
        if cfg.seeds.is_empty() {
            return Err(Error::Config("no seeds configured".into()));
        }
        let per_host = NonZeroUsize::new(cfg.connections_per_host)
            .ok_or_else(|| Error::Config("connections per host must be > 0".into()))?;

        let runtime = RuntimeBuilder::new_multi_thread()
            .enable_all()
            .thread_name("pqload-cql")
            .build()
            .map_err(|e| Error::Session(format!("runtime: {e}")))?;

        let mut policy = DefaultPolicy::builder().token_aware(true);
        if let Some(dc) = &cfg.datacenter {
            policy = policy.prefer_datacenter(dc.clone());
        }

        let profile = ExecutionProfile::builder()
            .consistency(Consistency::Any)
            .request_timeout(Some(cfg.timeout))
            .load_balancing_policy(policy.build())
            .build();

        let builder = SessionBuilder::new()
            .known_nodes(&cfg.seeds)
            .user(&cfg.username, &cfg.password)
            .pool_size(PoolSize::PerHost(per_host))
            .connection_timeout(cfg.timeout)
            .compression(cfg.compress.then_some(Compression::Snappy))
            .default_execution_profile_handle(profile.into_handle());

        let session = runtime
            .block_on(builder.build())
            .map_err(|e| Error::Session(e.to_string()))?;

        tracing::debug!(
            seeds = ?cfg.seeds,
            datacenter = ?cfg.datacenter,
            connections = cfg.connections_per_host,
            compress = cfg.compress,
            "cql session established"
        );

        Ok(Self {
            shared: Arc::new(Shared { session, runtime }),
            retries: cfg.retries,
        })
    }
}

impl Destination for CassandraDestination {
    fn describe_table(&self, keyspace: &str, table: &str) -> Result<Vec<ColumnMeta>> {
        let mut query = Query::new(DESCRIBE_COLUMNS);
        query.set_consistency(Consistency::LocalQuorum);

        let shared = &self.shared;
        let result = shared
            .runtime
            .block_on(shared.session.query(query, (keyspace, table)))
            .map_err(|e| Error::SchemaQuery(e.to_string()))?;

        let mut columns = Vec::new();
        for row in result
            .rows_typed::<(String, String)>()
            .map_err(|e| Error::SchemaQuery(e.to_string()))?
        {
            let (name, cql_type) = row.map_err(|e| Error::SchemaQuery(e.to_string()))?;
            columns.push(ColumnMeta::new(name, cql_type));
        }

        if columns.is_empty() {
            return Err(Error::TableNotFound {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            });
        }
        Ok(columns)
    }

    fn prepare(&self, template: &InsertTemplate) -> Result<Arc<dyn PreparedInsert>> {
        let shared = &self.shared;
        let mut statement = shared
            .runtime
            .block_on(shared.session.prepare(template.statement.as_str()))
            .map_err(|e| Error::Prepare(e.to_string()))?;
        statement.set_is_idempotent(true);

        Ok(Arc::new(CqlInsert {
            shared: Arc::clone(&self.shared),
            statement,
            retries: self.retries,
        }))
    }
}

struct CqlInsert {
    shared: Arc<Shared>,
    statement: PreparedStatement,
    retries: usize,
}

impl PreparedInsert for CqlInsert {
    fn execute(&self, values: &[Value]) -> Result<()> {
        let bound: Vec<MaybeUnset<CqlValue>> = values.iter().map(to_cql).collect();

        let mut attempt = 0usize;
        loop {
            let result = self
                .shared
                .runtime
                .block_on(self.shared.session.execute(&self.statement, &bound));
            match result {
                Ok(_) => return Ok(()),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(Error::Write(err.to_string()));
                    }
                    attempt += 1;
                }
            }
        }
    }
}

fn to_cql(value: &Value) -> MaybeUnset<CqlValue> {
    match value {
        Value::Unset => MaybeUnset::Unset,
        Value::Utf8String(s) => MaybeUnset::Set(CqlValue::Text(s.clone())),
        Value::Int32(i) => MaybeUnset::Set(CqlValue::Int(*i)),
        Value::Float64(f) => MaybeUnset::Set(CqlValue::Double(*f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_bind_as_cql_kinds() {
        assert!(matches!(to_cql(&Value::Unset), MaybeUnset::Unset));
        assert!(matches!(
            to_cql(&Value::Int32(4)),
            MaybeUnset::Set(CqlValue::Int(4))
        ));
        assert!(matches!(
            to_cql(&Value::Utf8String("a".into())),
            MaybeUnset::Set(CqlValue::Text(ref s)) if s == "a"
        ));
    }

    #[test]
    fn connect_rejects_empty_seed_list() {
        let cfg = DestinationConfig {
            seeds: Vec::new(),
            keyspace: "ks".into(),
            table: "t".into(),
            datacenter: None,
            username: "cassandra".into(),
            password: "cassandra".into(),
            connections_per_host: 1,
            retries: 0,
            timeout: std::time::Duration::from_secs(1),
            compress: false,
        };
        assert!(matches!(
            CassandraDestination::connect(&cfg),
            Err(Error::Config(_))
        ));
    }
}
