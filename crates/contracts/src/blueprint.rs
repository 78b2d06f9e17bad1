//! ReportingBlueprint - Config Loader output
//!
//! Describes a complete deployment: collector listener, client flush
//! policy and sink routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Full deployment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportingBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Collector settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Buffering client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Sinks in fan-out order
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Collector listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the collector listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:10000".to_string()
}

/// Default number of buffered events that triggers a flush
pub const DEFAULT_FLUSH_COUNT: usize = 10;
/// Default flush period in milliseconds
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 3000;
/// Shortest usable flush period in milliseconds
pub const MIN_FLUSH_INTERVAL_MS: u64 = 1;
/// Queue capacity multiplier applied to the flush count when unset
pub const QUEUE_CAPACITY_FACTOR: usize = 5;

/// Buffering client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Collector address
    #[serde(default = "default_listen_addr")]
    pub server_addr: String,

    /// Buffered event count that triggers an immediate flush (N)
    #[serde(default = "default_flush_count")]
    pub flush_count: usize,

    /// Flush period in milliseconds (T)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Ingestion queue capacity (C), defaults to 5 × flush_count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: default_listen_addr(),
            flush_count: DEFAULT_FLUSH_COUNT,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            queue_capacity: None,
        }
    }
}

fn default_flush_count() -> usize {
    DEFAULT_FLUSH_COUNT
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

impl ClientConfig {
    /// Config with the given thresholds and the default queue capacity
    pub fn with_flush(flush_count: usize, flush_interval: Duration) -> Self {
        Self {
            flush_count,
            flush_interval_ms: u64::try_from(flush_interval.as_millis())
                .unwrap_or(u64::MAX)
                .max(MIN_FLUSH_INTERVAL_MS),
            ..Default::default()
        }
    }

    /// Flush period as a Duration, never shorter than 1 ms
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(MIN_FLUSH_INTERVAL_MS))
    }

    /// Effective ingestion queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.flush_count.saturating_mul(QUEUE_CAPACITY_FACTOR))
            .max(1)
    }
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Pending put requests the sink worker queues
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

impl SinkConfig {
    /// Log sink with default settings
    pub fn log(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::Log,
            queue_capacity: default_queue_capacity(),
            params: HashMap::new(),
        }
    }

    /// SQLite sink writing to `path`
    pub fn sqlite(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::Sqlite,
            queue_capacity: default_queue_capacity(),
            params: HashMap::from([("path".to_string(), path.into())]),
        }
    }
}

/// Sink type
///
/// The in-memory relay sink takes a caller-owned channel and is only
/// constructed programmatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Structured log output
    Log,
    /// Durable SQLite store
    Sqlite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.flush_count, 10);
        assert_eq!(config.flush_interval(), Duration::from_secs(3));
        assert_eq!(config.queue_capacity(), 50);
    }

    #[test]
    fn queue_capacity_scales_with_flush_count() {
        let config = ClientConfig::with_flush(2, Duration::from_secs(3));
        assert_eq!(config.queue_capacity(), 10);

        let explicit = ClientConfig {
            queue_capacity: Some(3),
            ..config
        };
        assert_eq!(explicit.queue_capacity(), 3);
    }

    #[test]
    fn flush_interval_is_at_least_one_millisecond() {
        let sub_ms = ClientConfig::with_flush(2, Duration::from_micros(500));
        assert_eq!(sub_ms.flush_interval_ms, 1);
        assert_eq!(sub_ms.flush_interval(), Duration::from_millis(1));

        let zero = ClientConfig {
            flush_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert_eq!(zero.flush_interval(), Duration::from_millis(1));
    }

    #[test]
    fn sqlite_sink_config_has_path() {
        let config = SinkConfig::sqlite("warehouse", "/tmp/events.db");
        assert_eq!(config.sink_type, SinkType::Sqlite);
        assert_eq!(
            config.params.get("path").map(String::as_str),
            Some("/tmp/events.db")
        );
    }
}
