//! ChannelSink - relays events into a caller-owned channel

use contracts::{Event, EventSink, SinkError};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Sink that forwards every event to an `mpsc` receiver
///
/// Waits for channel capacity, so a receiver that stops reading stalls
/// this sink's worker.
pub struct ChannelSink {
    name: String,
    tx: mpsc::Sender<Event>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>, tx: mpsc::Sender<Event>) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }
}

impl EventSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "channel_sink_put",
        skip(self, events),
        fields(sink = %self.name, events = events.len())
    )]
    async fn put(&mut self, events: &[Event]) -> Result<(), SinkError> {
        for event in events {
            self.tx
                .send(event.clone())
                .await
                .map_err(|_| SinkError::closed(&self.name))?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        debug!(sink = %self.name, "ChannelSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ServerEvent, UserEvent};

    #[tokio::test]
    async fn test_channel_sink_relays_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut sink = ChannelSink::new("relay", tx);

        let events: Vec<Event> = vec![
            ServerEvent::login("a").into(),
            UserEvent::login("b").into(),
        ];
        sink.put(&events).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), events[0]);
        assert_eq!(rx.recv().await.unwrap(), events[1]);
    }

    #[tokio::test]
    async fn test_channel_sink_receiver_gone() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let mut sink = ChannelSink::new("relay", tx);

        let events: Vec<Event> = vec![ServerEvent::login("a").into()];
        let err = sink.put(&events).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed { .. }));
    }
}
