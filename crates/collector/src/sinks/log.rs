//! LogSink - one structured log record per event

use contracts::{Event, EventSink, SinkError};
use tracing::{info, instrument};

/// Sink that logs every event it receives
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_event(&self, event: &Event) {
        info!(
            sink = %self.name,
            id = %event.id(),
            event_type = event.type_name(),
            action = event.action(),
            account_id = event.account_id(),
            server_id = event.server_id(),
            user_id = event.user_id(),
            created = %event.created(),
            "Event received"
        );
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_put",
        skip(self, events),
        fields(sink = %self.name, events = events.len())
    )]
    async fn put(&mut self, events: &[Event]) -> Result<(), SinkError> {
        for event in events {
            self.log_event(event);
        }
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), SinkError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ServerEvent, UserEvent};

    #[tokio::test]
    async fn test_log_sink_put() {
        let mut sink = LogSink::new("test_log");
        let events: Vec<Event> = vec![
            ServerEvent::login("srv-1").into(),
            UserEvent::login("alice").into(),
        ];

        assert!(sink.put(&events).await.is_ok());
        assert!(sink.put(&[]).await.is_ok());
        assert!(sink.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
