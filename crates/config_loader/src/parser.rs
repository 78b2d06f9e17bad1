//! Configuration parsing
//!
//! TOML is the primary format; JSON is accepted as well.

use contracts::{ConfigError, ReportingBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<ReportingBlueprint, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<ReportingBlueprint, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<ReportingBlueprint, ConfigError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, SinkType};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
version = "v1"

[client]
flush_count = 5

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.client.flush_count, 5);
        assert_eq!(bp.client.flush_interval_ms, 3000);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Log);
        assert_eq!(bp.sinks[0].queue_capacity, 100);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "server": { "listen_addr": "0.0.0.0:9999" },
            "client": { "server_addr": "10.0.0.1:9999", "queue_capacity": 7 },
            "sinks": [{ "name": "db", "sink_type": "sqlite", "params": { "path": "a.db" } }]
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.server.listen_addr, "0.0.0.0:9999");
        assert_eq!(bp.client.queue_capacity(), 7);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Sqlite);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_sink_type() {
        let content = r#"
[[sinks]]
name = "bq"
sink_type = "bigquery"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
