//! ReportingClient - non-blocking event recording handle

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use contracts::{BatchTransport, ClientConfig, Event};

use crate::accumulator::Accumulator;
use crate::metrics::ReporterMetrics;

/// Cloneable handle for recording events
///
/// Every clone feeds the same accumulator task. The task exits once all
/// handles are dropped (after a final flush) or when the cancellation
/// token fires (without one).
#[derive(Clone)]
pub struct ReportingClient {
    tx: mpsc::Sender<Event>,
    metrics: Arc<ReporterMetrics>,
}

impl ReportingClient {
    /// Start the accumulator task
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn<T: BatchTransport + Send + 'static>(
        config: &ClientConfig,
        transport: T,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity());
        let metrics = Arc::new(ReporterMetrics::new());

        let accumulator = Accumulator::new(transport, rx, config.flush_count, Arc::clone(&metrics));
        let flush_interval = config.flush_interval();
        let task = tokio::spawn(accumulator.run(flush_interval, cancel));

        debug!(
            server_addr = %config.server_addr,
            flush_count = config.flush_count,
            queue_capacity = config.queue_capacity(),
            "Reporting client started"
        );

        (Self { tx, metrics }, task)
    }

    /// Enqueue an event without waiting
    ///
    /// If the queue is full the event is dropped; if the accumulator has
    /// stopped the event is dropped too. Neither case is reported to the
    /// caller beyond logs and metrics.
    pub fn record(&self, event: impl Into<Event>) {
        let event = event.into();
        let event_type = event.type_name();

        match self.tx.try_send(event) {
            Ok(()) => {
                self.metrics.record_recorded();
                observability::record_event_recorded(event_type);
            }
            Err(TrySendError::Full(event)) => {
                self.metrics.record_dropped();
                observability::record_event_dropped("queue_full");
                warn!(
                    id = %event.id(),
                    event_type,
                    "Event queue full, event dropped"
                );
            }
            Err(TrySendError::Closed(event)) => {
                self.metrics.record_dropped();
                observability::record_event_dropped("closed");
                debug!(id = %event.id(), event_type, "Reporter stopped, event dropped");
            }
        }
    }

    pub fn metrics(&self) -> &Arc<ReporterMetrics> {
        &self.metrics
    }
}
