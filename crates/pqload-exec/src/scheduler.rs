//! Bounded queue and worker pool.
//!
//! The queue is the only backpressure between the producer and the workers:
//! `push` blocks while it is full, `pop` blocks while it is empty, and once
//! the producer side is closed the workers drain what is left and exit.

use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use pqload_core::Row;
use pqload_io::PreparedInsert;

use crate::error::{LoadError, Result};
use crate::metrics::{ErrorTally, PeakGauge};

/// A fixed-capacity FIFO channel. Split it into its two ends before use.
pub struct BoundedQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    gauge: Arc<PeakGauge>,
}

impl<T> BoundedQueue<T> {
    pub fn with_capacity(cap: usize) -> Self {
        let (tx, rx) = bounded(cap.max(1));
        Self {
            tx,
            rx,
            gauge: Arc::new(PeakGauge::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(0)
    }

    pub fn split(self) -> (QueueProducer<T>, QueueConsumer<T>) {
        (
            QueueProducer {
                tx: self.tx,
                gauge: self.gauge,
            },
            QueueConsumer { rx: self.rx },
        )
    }
}

/// The single sending end. Closing consumes it, so the queue is closed once.
pub struct QueueProducer<T> {
    tx: Sender<T>,
    gauge: Arc<PeakGauge>,
}

impl<T> QueueProducer<T> {
    /// Block until there is room, then enqueue.
    pub fn push(&self, item: T) -> Result<()> {
        self.tx.send(item).map_err(|_| LoadError::Disconnected)?;
        self.gauge.record(self.tx.len());
        Ok(())
    }

    /// Rows currently buffered.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Signal end of input and return the queue's high-water mark.
    /// Buffered items are still delivered.
    pub fn close(self) -> usize {
        self.gauge.peak()
    }
}

/// A receiving end; clone one per worker.
#[derive(Clone)]
pub struct QueueConsumer<T> {
    rx: Receiver<T>,
}

impl<T> QueueConsumer<T> {
    /// Block for the next item. `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        self.rx.recv().ok()
    }
}

/// `N` worker threads writing rows through one prepared insert.
pub struct WorkerPool<'scope> {
    handles: Vec<ScopedJoinHandle<'scope, u64>>,
}

impl<'scope> WorkerPool<'scope> {
    /// Start `workers` threads on `scope`, each draining `queue` until it is
    /// closed and empty.
    pub fn spawn<'env>(
        scope: &'scope Scope<'scope, 'env>,
        workers: usize,
        queue: QueueConsumer<Row>,
        insert: Arc<dyn PreparedInsert>,
        tally: &'env ErrorTally,
    ) -> Result<Self> {
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let queue = queue.clone();
            let insert = Arc::clone(&insert);
            let handle = thread::Builder::new()
                .name(format!("pqload-worker-{id}"))
                .spawn_scoped(scope, move || work(id, &queue, insert.as_ref(), tally))
                .map_err(LoadError::Spawn)?;
            handles.push(handle);
        }
        tracing::debug!(workers, "worker pool started");
        Ok(Self { handles })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker and return the number of successful writes.
    pub fn join(self) -> Result<u64> {
        let mut successes = 0;
        let mut panicked = None;
        for (id, handle) in self.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(n) => successes += n,
                Err(_) => panicked = panicked.or(Some(id)),
            }
        }
        match panicked {
            Some(id) => Err(LoadError::WorkerPanic(id)),
            None => Ok(successes),
        }
    }
}

fn work(
    id: usize,
    queue: &QueueConsumer<Row>,
    insert: &dyn PreparedInsert,
    tally: &ErrorTally,
) -> u64 {
    let mut ok = 0;
    while let Some(row) = queue.pop() {
        match insert.execute(&row) {
            Ok(()) => ok += 1,
            Err(e) => {
                tally.increment();
                tracing::debug!(worker = id, error = %e, "insert failed");
            }
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use pqload_core::{ColumnMeta, FieldDescriptor, SemanticType, Value};
    use pqload_io::{Destination, MemorySink};

    fn insert_into(sink: &MemorySink) -> Arc<dyn PreparedInsert> {
        let fields = vec![FieldDescriptor::new("v", SemanticType::Int32)];
        let cols = vec![ColumnMeta::new("v", "int")];
        let outcome = pqload_core::validate_schema("ks", "t", &fields, &cols, false).unwrap();
        sink.prepare(&outcome.template).unwrap()
    }

    #[test]
    fn closed_queue_drains_before_exit() {
        let (tx, rx) = BoundedQueue::with_capacity(4).split();
        for i in 0..3 {
            tx.push(i).unwrap();
        }
        assert_eq!(tx.len(), 3);
        assert_eq!(tx.close(), 3);

        let drained: Vec<i32> = std::iter::from_fn(|| rx.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2]);
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn push_after_consumers_gone_is_disconnected() {
        let (tx, rx) = BoundedQueue::with_capacity(1).split();
        drop(rx);
        assert!(matches!(tx.push(1), Err(LoadError::Disconnected)));
    }

    #[test]
    fn pool_counts_successes_and_failures() {
        let sink = MemorySink::new(vec![ColumnMeta::new("v", "int")]).fail_every(4);
        let insert = insert_into(&sink);
        let tally = ErrorTally::new();

        let successes = thread::scope(|s| {
            let (tx, rx) = BoundedQueue::with_capacity(8).split();
            let pool = WorkerPool::spawn(s, 3, rx, insert, &tally).unwrap();
            assert_eq!(pool.len(), 3);
            for i in 0..40 {
                tx.push(vec![Value::Int32(i)]).unwrap();
            }
            tx.close();
            pool.join().unwrap()
        });

        assert_eq!(tally.get(), 10);
        assert_eq!(successes, 30);
        assert_eq!(successes + tally.get(), 40);
        assert_eq!(sink.written(), 30);
    }

    #[test]
    fn capacity_one_never_buffers_more_than_one_row() {
        let sink = MemorySink::new(vec![ColumnMeta::new("v", "int")])
            .with_latency(Duration::from_millis(1));
        let insert = insert_into(&sink);
        let tally = ErrorTally::new();

        let peak = thread::scope(|s| {
            let queue = BoundedQueue::with_capacity(1);
            assert_eq!(queue.capacity(), 1);
            let (tx, rx) = queue.split();
            let pool = WorkerPool::spawn(s, 1, rx, insert, &tally).unwrap();
            for i in 0..50 {
                tx.push(vec![Value::Int32(i)]).unwrap();
                assert!(tx.len() <= 1);
            }
            let peak = tx.close();
            pool.join().unwrap();
            peak
        });

        assert!(peak <= 1);
        assert_eq!(sink.written(), 50);
    }

    /// Announces each row it takes, then holds it until the gate closes.
    struct GatedInsert {
        started: Sender<()>,
        gate: Receiver<()>,
    }

    impl PreparedInsert for GatedInsert {
        fn execute(&self, _values: &[Value]) -> pqload_io::Result<()> {
            let _ = self.started.send(());
            let _ = self.gate.recv();
            Ok(())
        }
    }

    #[test]
    fn full_single_slot_queue_blocks_the_producer() {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release, gate) = bounded::<()>(0);
        let insert: Arc<dyn PreparedInsert> = Arc::new(GatedInsert {
            started: started_tx,
            gate,
        });
        let tally = ErrorTally::new();
        let third_pushed = AtomicBool::new(false);

        let successes = thread::scope(|s| {
            let (tx, rx) = BoundedQueue::with_capacity(1).split();
            let pool = WorkerPool::spawn(s, 1, rx, insert, &tally).unwrap();

            tx.push(vec![Value::Int32(0)]).unwrap();
            started_rx.recv().unwrap();
            tx.push(vec![Value::Int32(1)]).unwrap();
            assert_eq!(tx.len(), 1);

            let flag = &third_pushed;
            let pusher = s.spawn(move || {
                tx.push(vec![Value::Int32(2)]).unwrap();
                flag.store(true, Ordering::SeqCst);
                tx.close()
            });

            // The worker is parked on row 0 and row 1 fills the slot.
            thread::sleep(Duration::from_millis(100));
            assert!(!third_pushed.load(Ordering::SeqCst));

            drop(release);
            let peak = pusher.join().unwrap();
            assert!(third_pushed.load(Ordering::SeqCst));
            assert_eq!(peak, 1);
            pool.join().unwrap()
        });

        assert_eq!(successes, 3);
        assert_eq!(tally.get(), 0);
    }
}
