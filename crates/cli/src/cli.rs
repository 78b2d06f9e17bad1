//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Reporting - buffered event reporting and collection
#[derive(Parser, Debug)]
#[command(
    name = "reporting",
    author,
    version,
    about = "Buffered event reporting pipeline",
    long_about = "Records server and user events, delivers them in batches to a collector,\n\
                  and fans them out to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "REPORTING_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "REPORTING_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a collector and accept batches over TCP
    Serve(ServeArgs),

    /// Record events and deliver them to a collector
    Emit(EmitArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "REPORTING_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address from configuration
    #[arg(long, env = "REPORTING_LISTEN")]
    pub listen: Option<String>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "REPORTING_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `emit` command
#[derive(Parser, Debug, Clone)]
pub struct EmitArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "REPORTING_CONFIG")]
    pub config: PathBuf,

    /// Override the collector address from configuration
    #[arg(long, env = "REPORTING_SERVER")]
    pub server: Option<String>,

    /// Event type to emit
    #[arg(long, value_enum, default_value = "server")]
    pub kind: EventKind,

    /// Server or user id carried by the events
    #[arg(long)]
    pub id: String,

    /// Event action
    #[arg(long, default_value = contracts::EVENT_ACTION_LOGIN)]
    pub action: String,

    /// Account id to stamp on every event
    #[arg(long)]
    pub account: Option<String>,

    /// Number of events to emit
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Event variant selected on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Server,
    User,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
