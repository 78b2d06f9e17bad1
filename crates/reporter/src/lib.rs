//! # Reporter
//!
//! Client side of the reporting pipeline.
//!
//! Responsibilities:
//! - Accept events from application code without ever blocking it
//! - Buffer them in a single accumulator task
//! - Flush on count (`flush_count`) or on a fixed period (`flush_interval`)
//! - Keep the buffer across failed flushes (at-least-once delivery)
//!
//! ## Usage Example
//!
//! ```ignore
//! use reporter::{ReportingClient, TcpTransport};
//! use contracts::{ClientConfig, ServerEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ClientConfig::default();
//! let transport = TcpTransport::new(&config.server_addr);
//! let (client, task) = ReportingClient::spawn(&config, transport, CancellationToken::new());
//!
//! client.record(ServerEvent::login("srv-1"));
//! drop(client);
//! task.await?;
//! ```

mod accumulator;
mod client;
mod metrics;
mod mock;
mod tcp;

pub use client::ReportingClient;
pub use contracts::{BatchTransport, ClientConfig, Event};
pub use metrics::{ReporterMetrics, ReporterSnapshot};
pub use mock::MockTransport;
pub use tcp::TcpTransport;
