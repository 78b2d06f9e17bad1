//! # Collector
//!
//! Server side of the reporting pipeline.
//!
//! Responsibilities:
//! - Decode inbound `RawBatch`es, rejecting the whole batch on any bad envelope
//! - Fan decoded events out to every configured sink, in order
//! - Aggregate sink failures without rolling back the sinks that succeeded
//! - Serve the TCP wire protocol and an in-process transport

pub mod collector;
pub mod error;
pub mod handle;
pub mod local;
pub mod metrics;
pub mod server;
pub mod sinks;

pub use collector::{Collector, CollectorBuilder};
pub use contracts::{EventSink, RawBatch};
pub use error::{CollectorError, DispatcherError};
pub use handle::SinkHandle;
pub use local::LocalTransport;
pub use metrics::{CollectorMetrics, CollectorSnapshot, MetricsSnapshot, SinkMetrics};
pub use server::serve;
pub use sinks::{ChannelSink, LogSink, SqliteSink};
