//! SinkHandle - owns a sink inside a dedicated worker task
//!
//! Callers submit puts through a bounded request queue and await the
//! sink's answer on a oneshot reply channel. Only the worker ever touches
//! the sink, so puts from concurrent batches are serialized.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use contracts::{Event, EventSink, SinkError};

use crate::metrics::SinkMetrics;

struct PutRequest {
    events: Arc<[Event]>,
    reply: oneshot::Sender<Result<(), SinkError>>,
}

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<PutRequest>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task; must be called inside a Tokio runtime
    pub fn spawn<S: EventSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Apply `events` to the sink and wait for the result
    ///
    /// Waits for queue capacity when the worker is behind.
    pub async fn put(&self, events: Arc<[Event]>) -> Result<(), SinkError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PutRequest { events, reply })
            .await
            .map_err(|_| SinkError::closed(&self.name))?;
        self.metrics
            .set_queue_len(self.tx.max_capacity() - self.tx.capacity());

        rx.await.map_err(|_| SinkError::closed(&self.name))?
    }

    /// Stop accepting puts, drain the queue and close the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: EventSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<PutRequest>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(request) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let started = Instant::now();
        let result = sink.put(&request.events).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(()) => metrics.inc_put_count(request.events.len()),
            Err(e) => {
                metrics.inc_failure_count();
                error!(
                    sink = %name,
                    events = request.events.len(),
                    error = %e,
                    "Put failed"
                );
            }
        }
        observability::record_sink_put(&name, result.is_ok(), latency_ms);

        // Requester may have given up
        let _ = request.reply.send(result);
    }

    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ServerEvent, UserEvent};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    struct MockSink {
        name: String,
        put_count: Arc<AtomicU64>,
        closed: Arc<AtomicBool>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockSink {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                put_count: Arc::new(AtomicU64::new(0)),
                closed: Arc::new(AtomicBool::new(false)),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl EventSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn put(&mut self, _events: &[Event]) -> Result<(), SinkError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(SinkError::write(&self.name, "mock failure"));
            }
            self.put_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), SinkError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn events() -> Arc<[Event]> {
        vec![
            ServerEvent::login("srv").into(),
            UserEvent::login("alice").into(),
        ]
        .into()
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let sink = MockSink::new("test");
        let put_count = Arc::clone(&sink.put_count);
        let closed = Arc::clone(&sink.closed);

        let handle = SinkHandle::spawn(sink, 10);
        for _ in 0..5 {
            handle.put(events()).await.unwrap();
        }

        let snap = handle.metrics().snapshot();
        assert_eq!(snap.put_count, 5);
        assert_eq!(snap.event_count, 10);

        handle.shutdown().await;
        assert_eq!(put_count.load(Ordering::Relaxed), 5);
        assert!(closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_sink_handle_returns_sink_error() {
        let sink = MockSink {
            should_fail: true,
            ..MockSink::new("failing")
        };

        let handle = SinkHandle::spawn(sink, 10);
        let err = handle.put(events()).await.unwrap_err();
        assert_eq!(err.sink_name(), "failing");
        assert!(matches!(err, SinkError::Write { .. }));

        // Worker keeps serving after a failure
        assert!(handle.put(events()).await.is_err());
        assert_eq!(handle.metrics().failure_count(), 2);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_puts_are_serialized() {
        let sink = MockSink {
            delay_ms: 10,
            ..MockSink::new("slow")
        };
        let put_count = Arc::clone(&sink.put_count);

        let handle = Arc::new(SinkHandle::spawn(sink, 1));
        let mut tasks = Vec::new();
        for _ in 0..4 {
            let handle = Arc::clone(&handle);
            tasks.push(tokio::spawn(async move { handle.put(events()).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(put_count.load(Ordering::Relaxed), 4);
    }
}
