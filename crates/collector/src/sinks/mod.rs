//! Sink implementations
//!
//! Contains LogSink, ChannelSink, and SqliteSink.

mod channel;
mod log;
mod sqlite;

pub use self::channel::ChannelSink;
pub use self::log::LogSink;
pub use self::sqlite::SqliteSink;
