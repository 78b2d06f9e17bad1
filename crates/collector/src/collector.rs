//! Collector - decode inbound batches and fan them out to sinks

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use contracts::{
    decode_batch, Ack, AggregateError, Event, EventSink, RawBatch, SinkConfig, SinkType,
};

use crate::error::{CollectorError, DispatcherError};
use crate::handle::SinkHandle;
use crate::metrics::{CollectorMetrics, CollectorSnapshot, MetricsSnapshot};
use crate::sinks::{LogSink, SqliteSink};

/// Default request queue depth for programmatically added sinks
const DEFAULT_SINK_QUEUE: usize = 100;

enum SinkSlot {
    Config(SinkConfig),
    Ready(SinkHandle),
}

/// Builder for creating a Collector
///
/// Sinks run in the order they were added, configured and programmatic
/// sinks interleaved as given.
pub struct CollectorBuilder {
    slots: Vec<SinkSlot>,
}

impl CollectorBuilder {
    pub fn new(sink_configs: Vec<SinkConfig>) -> Self {
        Self {
            slots: sink_configs.into_iter().map(SinkSlot::Config).collect(),
        }
    }

    /// Append a sink built in code; must be called inside a Tokio runtime
    pub fn with_sink<S: EventSink + Send + 'static>(self, sink: S) -> Self {
        self.with_handle(SinkHandle::spawn(sink, DEFAULT_SINK_QUEUE))
    }

    /// Append an already running sink handle
    pub fn with_handle(mut self, handle: SinkHandle) -> Self {
        self.slots.push(SinkSlot::Ready(handle));
        self
    }

    /// Create configured sinks and start the collector
    ///
    /// # Errors
    /// `DispatcherError::SinkCreation` if a sink cannot be provisioned.
    #[instrument(name = "collector_builder_build", skip(self), fields(sink_count = self.slots.len()))]
    pub async fn build(self) -> Result<Collector, DispatcherError> {
        let mut handles = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            let handle = match slot {
                SinkSlot::Config(config) => create_sink_handle(&config).await?,
                SinkSlot::Ready(handle) => handle,
            };
            handles.push(handle);
        }
        Ok(Collector::with_handles(handles))
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "collector_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Sqlite => {
            let name = config.name.clone();
            let params = config.params.clone();
            let sink = tokio::task::spawn_blocking(move || SqliteSink::from_params(name, &params))
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Receives batches and delivers them to every sink
///
/// Shared as `Arc<Collector>`; `handle_batch` may run concurrently for
/// different connections.
pub struct Collector {
    handles: Vec<SinkHandle>,
    metrics: CollectorMetrics,
}

impl Collector {
    /// Create a collector with custom sink handles (for testing)
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        info!(
            sinks = ?handles.iter().map(SinkHandle::name).collect::<Vec<_>>(),
            "Collector started"
        );
        Self {
            handles,
            metrics: CollectorMetrics::new(),
        }
    }

    /// Decode a batch and put it to every sink in order
    ///
    /// # Errors
    /// - `CollectorError::Decode` if any envelope is invalid; no sink is called
    /// - `CollectorError::Sinks` listing every sink that failed; sinks that
    ///   succeeded keep the events
    #[instrument(name = "collector_handle_batch", skip(self, batch), fields(envelopes = batch.len()))]
    pub async fn handle_batch(&self, batch: RawBatch) -> Result<Ack, CollectorError> {
        let events = match decode_batch(&batch) {
            Ok(events) => events,
            Err(e) => {
                self.metrics.inc_rejected();
                observability::record_batch_rejected();
                warn!(error = %e, "Batch rejected");
                return Err(e.into());
            }
        };

        let accepted = events.len();
        if accepted == 0 {
            return Ok(Ack { accepted: 0 });
        }
        observability::record_batch_received(accepted);

        let events: Arc<[Event]> = events.into();
        let mut failures = AggregateError::default();
        for handle in &self.handles {
            if let Err(e) = handle.put(Arc::clone(&events)).await {
                warn!(sink = handle.name(), error = %e, "Sink put failed");
                failures.push(e);
            }
        }

        if let Err(e) = failures.into_result() {
            self.metrics.inc_failed();
            return Err(e.into());
        }

        self.metrics.inc_accepted(accepted);
        debug!(accepted, "Batch delivered");
        Ok(Ack { accepted })
    }

    /// Metrics for all sinks, in fan-out order
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Batch-level counters
    pub fn stats(&self) -> CollectorSnapshot {
        self.metrics.snapshot()
    }

    /// Drain and close every sink
    #[instrument(name = "collector_shutdown", skip(self))]
    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.shutdown().await;
        }
        info!("Collector shutdown complete");
    }
}
