//! EventSink trait - collector output interface
//!
//! Defines the abstract interface for sinks.

use crate::{Event, SinkError};

/// Event output trait
///
/// All sink implementations must implement this trait. A sink is driven
/// by exactly one worker task, so `put` calls never overlap.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Apply an ordered sequence of events
    ///
    /// # Errors
    /// Returns `SinkError::Items` when only some events failed, any other
    /// variant when the whole put failed.
    async fn put(&mut self, events: &[Event]) -> Result<(), SinkError>;

    /// Release resources
    async fn close(&mut self) -> Result<(), SinkError>;
}
