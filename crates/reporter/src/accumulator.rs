//! Accumulator task - sole owner of the event buffer
//!
//! Wakes on cancellation, on a dequeued event, or on the flush timer, in
//! that priority order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use contracts::{encode, BatchTransport, Event, RawBatch};

use crate::metrics::ReporterMetrics;

pub(crate) struct Accumulator<T> {
    transport: T,
    rx: mpsc::Receiver<Event>,
    buffer: Vec<Event>,
    flush_count: usize,
    metrics: Arc<ReporterMetrics>,
}

impl<T: BatchTransport> Accumulator<T> {
    pub(crate) fn new(
        transport: T,
        rx: mpsc::Receiver<Event>,
        flush_count: usize,
        metrics: Arc<ReporterMetrics>,
    ) -> Self {
        Self {
            transport,
            rx,
            buffer: Vec::with_capacity(flush_count),
            flush_count: flush_count.max(1),
            metrics,
        }
    }

    #[instrument(
        name = "reporter_accumulator_loop",
        skip_all,
        fields(flush_count = self.flush_count, flush_interval_ms = flush_interval.as_millis() as u64)
    )]
    pub(crate) async fn run(mut self, flush_interval: Duration, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + flush_interval, flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Accumulator started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!(pending = self.buffer.len(), "Reporter cancelled, buffered events discarded");
                    break;
                }

                received = self.rx.recv() => match received {
                    Some(event) => {
                        self.buffer.push(event);
                        self.metrics.update_pending(self.buffer.len());
                        if self.buffer.len() >= self.flush_count {
                            self.flush().await;
                        }
                    }
                    None => {
                        debug!(pending = self.buffer.len(), "Event queue closed, final flush");
                        self.flush().await;
                        break;
                    }
                },

                _ = ticker.tick() => self.flush().await,
            }
        }

        debug!("Accumulator stopped");
    }

    /// Send everything buffered as one batch
    ///
    /// The buffer is cleared only on acknowledgement; on failure it is kept
    /// in order and retried at the next trigger.
    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let mut envelopes = Vec::with_capacity(self.buffer.len());
        let metrics = &self.metrics;
        self.buffer.retain(|event| match encode(event) {
            Ok(envelope) => {
                envelopes.push(envelope);
                true
            }
            Err(e) => {
                error!(id = %event.id(), error = %e, "Event cannot be encoded, dropped");
                metrics.record_dropped();
                observability::record_event_dropped("encode");
                false
            }
        });
        self.metrics.update_pending(self.buffer.len());

        if envelopes.is_empty() {
            return;
        }

        let batch_size = envelopes.len();
        match self.transport.send(RawBatch::new(envelopes)).await {
            Ok(ack) => {
                debug!(events = batch_size, accepted = ack.accepted, "Flushed");
                self.buffer.clear();
                self.metrics.record_flush(batch_size);
                self.metrics.update_pending(0);
                observability::record_flush(batch_size, true);
            }
            Err(e) => {
                warn!(
                    events = batch_size,
                    error = %e,
                    "Flush failed, events kept for retry"
                );
                self.metrics.record_flush_failure();
                observability::record_flush(batch_size, false);
            }
        }
    }
}
