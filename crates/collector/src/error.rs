//! Collector error types

use contracts::{AggregateError, DecodeError};
use thiserror::Error;

/// Why a batch was not acknowledged
#[derive(Debug, Error)]
pub enum CollectorError {
    /// At least one envelope failed to decode; no sink saw the batch
    #[error("batch rejected: {0}")]
    Decode(#[from] DecodeError),

    /// One or more sinks failed; the others applied the batch
    #[error("{0}")]
    Sinks(#[from] AggregateError),
}

/// Collector construction errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
