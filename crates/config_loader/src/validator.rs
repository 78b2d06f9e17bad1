//! Configuration validation
//!
//! Rules:
//! - flush_count > 0, flush_interval_ms > 0, queue_capacity > 0
//! - listen_addr is a socket address, server_addr is non-empty
//! - sink names are non-empty and unique
//! - sqlite sinks carry a `path` parameter
//! - sink worker queue_capacity > 0

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{ConfigError, ReportingBlueprint, SinkType};

/// Validate a ReportingBlueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &ReportingBlueprint) -> Result<(), ConfigError> {
    validate_server(blueprint)?;
    validate_client(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_server(blueprint: &ReportingBlueprint) -> Result<(), ConfigError> {
    let addr = &blueprint.server.listen_addr;
    addr.parse::<SocketAddr>().map_err(|e| {
        ConfigError::config_validation(
            "server.listen_addr",
            format!("'{addr}' is not a socket address: {e}"),
        )
    })?;
    Ok(())
}

fn validate_client(blueprint: &ReportingBlueprint) -> Result<(), ConfigError> {
    let client = &blueprint.client;

    if client.server_addr.trim().is_empty() {
        return Err(ConfigError::config_validation(
            "client.server_addr",
            "server_addr cannot be empty",
        ));
    }
    if client.flush_count == 0 {
        return Err(ConfigError::config_validation(
            "client.flush_count",
            "flush_count must be > 0",
        ));
    }
    if client.flush_interval_ms == 0 {
        return Err(ConfigError::config_validation(
            "client.flush_interval_ms",
            "flush_interval_ms must be > 0",
        ));
    }
    if client.queue_capacity == Some(0) {
        return Err(ConfigError::config_validation(
            "client.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_sinks(blueprint: &ReportingBlueprint) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ConfigError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ConfigError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ConfigError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::Sqlite
            && sink.params.get("path").map_or(true, |p| p.is_empty())
        {
            return Err(ConfigError::config_validation(
                format!("sinks[{}].params.path", sink.name),
                "sqlite sink requires a 'path' parameter",
            ));
        }
    }
    Ok(())
}
