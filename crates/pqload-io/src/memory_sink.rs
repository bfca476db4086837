//! In-memory destination for testing.
//!
//! Records every successful write. Can be told to fail every n-th attempt and
//! to sleep on each write, which is enough to drive the worker pool through
//! its error accounting and backpressure paths without a cluster.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use pqload_core::{ColumnMeta, InsertTemplate, Value};

use crate::error::{Error, Result};
use crate::sinks::{Destination, PreparedInsert};

/// Shared between the sink and every insert prepared from it.
#[derive(Debug, Default)]
struct Recorded {
    rows: Mutex<Vec<Vec<Value>>>,
    statement: Mutex<Option<String>>,
    attempts: AtomicU64,
}

/// Thread-safe in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    columns: Arc<Vec<ColumnMeta>>,
    recorded: Arc<Recorded>,
    fail_every: Option<u64>,
    latency: Option<Duration>,
    fail_prepare: bool,
    arity: usize,
}

impl MemorySink {
    /// A sink whose table has `columns`.
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self {
            columns: Arc::new(columns),
            ..Default::default()
        }
    }

    /// Fail every `n`-th write attempt (1-based).
    pub fn fail_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    /// Sleep this long inside every write.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make `prepare` fail.
    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    /// Rows written successfully, in completion order.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        lock(&self.recorded.rows).clone()
    }

    pub fn written(&self) -> usize {
        lock(&self.recorded.rows).len()
    }

    pub fn attempts(&self) -> u64 {
        self.recorded.attempts.load(Ordering::Relaxed)
    }

    /// The last statement passed to `prepare`.
    pub fn statement(&self) -> Option<String> {
        lock(&self.recorded.statement).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Destination for MemorySink {
    fn describe_table(&self, keyspace: &str, table: &str) -> Result<Vec<ColumnMeta>> {
        if self.columns.is_empty() {
            return Err(Error::TableNotFound {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            });
        }
        Ok(self.columns.as_ref().clone())
    }

    fn prepare(&self, template: &InsertTemplate) -> Result<Arc<dyn PreparedInsert>> {
        if self.fail_prepare {
            return Err(Error::Prepare(format!("rejected: {}", template.statement)));
        }
        *lock(&self.recorded.statement) = Some(template.statement.clone());
        Ok(Arc::new(MemorySink {
            arity: template.arity(),
            ..self.clone()
        }))
    }
}

impl PreparedInsert for MemorySink {
    fn execute(&self, values: &[Value]) -> Result<()> {
        let attempt = self.recorded.attempts.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }

        if values.len() != self.arity {
            return Err(Error::Write(format!(
                "bound {} values to a {}-column insert",
                values.len(),
                self.arity
            )));
        }

        if let Some(n) = self.fail_every {
            if attempt % n == 0 {
                return Err(Error::Write(format!("injected failure on attempt {attempt}")));
            }
        }

        lock(&self.recorded.rows).push(values.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqload_core::{validate_schema, FieldDescriptor, SemanticType};

    fn template() -> InsertTemplate {
        let fields = vec![
            FieldDescriptor::new("a", SemanticType::Int32),
            FieldDescriptor::new("b", SemanticType::Utf8String),
        ];
        let cols = vec![ColumnMeta::new("a", "int"), ColumnMeta::new("b", "text")];
        validate_schema("ks", "t", &fields, &cols, false)
            .unwrap()
            .template
    }

    fn columns() -> Vec<ColumnMeta> {
        vec![ColumnMeta::new("a", "int"), ColumnMeta::new("b", "text")]
    }

    #[test]
    fn records_successful_writes() {
        let sink = MemorySink::new(columns());
        let insert = sink.prepare(&template()).unwrap();
        insert
            .execute(&[Value::Int32(1), Value::Utf8String("x".into())])
            .unwrap();
        insert.execute(&[Value::Int32(2), Value::Unset]).unwrap();

        assert_eq!(sink.written(), 2);
        assert_eq!(sink.rows()[1], vec![Value::Int32(2), Value::Unset]);
        assert!(sink.statement().unwrap().starts_with("INSERT INTO \"ks\".\"t\""));
    }

    #[test]
    fn fails_every_nth_attempt() {
        let sink = MemorySink::new(columns()).fail_every(3);
        let insert = sink.prepare(&template()).unwrap();
        let failures = (0..9)
            .filter(|i| insert.execute(&[Value::Int32(*i), Value::Unset]).is_err())
            .count();
        assert_eq!(failures, 3);
        assert_eq!(sink.written(), 6);
        assert_eq!(sink.attempts(), 9);
    }

    #[test]
    fn wrong_arity_is_a_write_error() {
        let sink = MemorySink::new(columns());
        let insert = sink.prepare(&template()).unwrap();
        assert!(matches!(insert.execute(&[Value::Unset]), Err(Error::Write(_))));
    }

    #[test]
    fn unknown_table_and_prepare_failures() {
        assert!(matches!(
            MemorySink::new(Vec::new()).describe_table("ks", "t"),
            Err(Error::TableNotFound { .. })
        ));
        assert!(MemorySink::new(columns())
            .failing_prepare()
            .prepare(&template())
            .is_err());
    }
}
