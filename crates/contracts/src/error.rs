//! Layered error definitions
//!
//! Categorized by source: codec / transport / sink / config

use std::fmt;

use thiserror::Error;

use crate::EventId;

// ===== Codec Errors =====

/// Event could not be serialized into an envelope
///
/// Only happens for in-memory state that JSON cannot represent.
#[derive(Debug, Error)]
#[error("failed to encode {type_name} event {event_id}: {source}")]
pub struct EncodeError {
    pub type_name: &'static str,
    pub event_id: EventId,
    #[source]
    pub source: serde_json::Error,
}

/// Envelope could not be turned back into an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Kind or version is not the one this build understands
    #[error("unknown resource kind/version {kind:?}/{version:?}")]
    UnknownKind { kind: String, version: String },

    /// No decoder registered for the type name
    #[error("unknown event type {type_name:?}")]
    UnknownType { type_name: String },

    /// Payload failed strict schema validation
    #[error("malformed {type_name:?} payload: {message}")]
    Malformed { type_name: String, message: String },
}

impl DecodeError {
    pub fn malformed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

// ===== Transport Errors =====

/// Batch could not be delivered to the collector
#[derive(Debug, Error)]
pub enum SendError {
    /// Connection could not be established
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO failure on an established connection
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame could not be encoded or decoded
    #[error("transport codec error: {message}")]
    Codec { message: String },

    /// Collector received the batch and rejected it
    #[error("batch rejected by collector: {message}")]
    Rejected { message: String },

    /// Transport is shut down
    #[error("transport closed")]
    Closed,
}

impl SendError {
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

// ===== Sink Errors =====

/// One event a sink failed to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub event_id: EventId,
    pub message: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.event_id, self.message)
    }
}

/// Failure reported by a single sink
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// Some events were not applied; the rest were
    #[error("sink '{sink_name}' failed {} item(s): {}", failures.len(), join(failures))]
    Items {
        sink_name: String,
        failures: Vec<ItemFailure>,
    },

    /// The whole put failed
    #[error("sink '{sink_name}' write error: {message}")]
    Write { sink_name: String, message: String },

    /// Sink is no longer accepting events
    #[error("sink '{sink_name}' is closed")]
    Closed { sink_name: String },
}

impl SinkError {
    pub fn write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn closed(sink_name: impl Into<String>) -> Self {
        Self::Closed {
            sink_name: sink_name.into(),
        }
    }

    pub fn sink_name(&self) -> &str {
        match self {
            Self::Items { sink_name, .. }
            | Self::Write { sink_name, .. }
            | Self::Closed { sink_name } => sink_name,
        }
    }
}

/// Failures of every sink that failed for one batch, in fan-out order
#[derive(Debug, Clone, Default)]
pub struct AggregateError {
    pub errors: Vec<SinkError>,
}

impl AggregateError {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, error: SinkError) {
        self.errors.push(error);
    }

    /// `Ok(())` when no sink failed
    pub fn into_result(self) -> Result<(), AggregateError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sink(s) failed: {}", self.errors.len(), join(&self.errors))
    }
}

impl std::error::Error for AggregateError {}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ===== Configuration Errors =====

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_display_lists_every_sink() {
        let id = EventId::random();
        let mut agg = AggregateError::default();
        agg.push(SinkError::write("bq", "timeout"));
        agg.push(SinkError::Items {
            sink_name: "sqlite".into(),
            failures: vec![ItemFailure {
                event_id: id,
                message: "constraint".into(),
            }],
        });

        let text = agg.to_string();
        assert!(text.starts_with("2 sink(s) failed"));
        assert!(text.contains("sink 'bq' write error: timeout"));
        assert!(text.contains(&format!("{id}: constraint")));
    }

    #[test]
    fn test_empty_aggregate_is_ok() {
        assert!(AggregateError::default().into_result().is_ok());
    }

    #[test]
    fn test_sink_name() {
        assert_eq!(SinkError::closed("relay").sink_name(), "relay");
    }
}
