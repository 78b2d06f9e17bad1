//! # Integration Tests
//!
//! End-to-end scenarios across the reporting client, the transports and
//! the collector's sinks.

#[cfg(test)]
mod contract_tests {
    use contracts::{decode, encode, Event, ServerEvent, UserEvent};

    #[test]
    fn test_envelope_survives_bincode_frame() {
        let event: Event = UserEvent::login("user-1").into();
        let event = event.with_account_id("acc-1");

        let envelope = encode(&event).unwrap();
        let frame = contracts::wire::encode_frame(&envelope).unwrap();
        let envelope = contracts::wire::decode_frame(&frame[contracts::wire::FRAME_HEADER_LEN..])
            .unwrap();

        assert_eq!(decode(&envelope).unwrap(), event);
        assert_ne!(
            encode(&ServerEvent::login("srv").into()).unwrap().type_name,
            envelope.type_name
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use collector::{serve, ChannelSink, Collector, CollectorBuilder, LocalTransport, SqliteSink};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        encode, Ack, BatchTransport, ClientConfig, Envelope, Event, RawBatch, SendError,
        ServerEvent, SinkConfig, UserEvent,
    };
    use reporter::{ReportingClient, TcpTransport};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    const T: Duration = Duration::from_secs(3);

    async fn relay_collector() -> (Arc<Collector>, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(16);
        let collector = CollectorBuilder::new(vec![])
            .with_sink(ChannelSink::new("relay", tx))
            .build()
            .await
            .unwrap();
        (Arc::new(collector), rx)
    }

    fn events_ab() -> (Event, Event) {
        let a: Event = ServerEvent::login("server-a").into();
        let b: Event = UserEvent::login("user-b").into();
        (a.with_account_id("acc"), b)
    }

    async fn recv_n(rx: &mut mpsc::Receiver<Event>, n: usize) -> Vec<Event> {
        let mut received = Vec::with_capacity(n);
        for _ in 0..n {
            let event = timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("relay timed out")
                .expect("relay closed");
            received.push(event);
        }
        received
    }

    /// Count trigger with an in-process transport: A and B arrive together
    #[tokio::test(start_paused = true)]
    async fn test_e2e_local_count_flush() {
        let (collector, mut rx) = relay_collector().await;
        let config = ClientConfig::with_flush(2, T);
        let (client, task) = ReportingClient::spawn(
            &config,
            LocalTransport::new(Arc::clone(&collector)),
            CancellationToken::new(),
        );

        let (a, b) = events_ab();
        client.record(a.clone());
        client.record(b.clone());

        assert_eq!(recv_n(&mut rx, 2).await, vec![a, b]);

        let snapshot = client.metrics().snapshot();
        assert_eq!(snapshot.flushes, 1);
        assert_eq!(snapshot.events_sent, 2);
        assert_eq!(collector.stats().batches_accepted, 1);

        drop(client);
        task.await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    /// Timer trigger: a single event is delivered after T
    #[tokio::test(start_paused = true)]
    async fn test_e2e_local_timer_flush() {
        let (collector, mut rx) = relay_collector().await;
        let config = ClientConfig::with_flush(2, T);
        let (client, _task) = ReportingClient::spawn(
            &config,
            LocalTransport::new(Arc::clone(&collector)),
            CancellationToken::new(),
        );

        let (a, _) = events_ab();
        client.record(a.clone());

        tokio::time::sleep(T - Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(recv_n(&mut rx, 1).await, vec![a]);
    }

    /// Same flow over the TCP protocol
    #[tokio::test]
    async fn test_e2e_tcp_count_flush() {
        let (collector, mut rx) = relay_collector().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(listener, Arc::clone(&collector), cancel.clone()));

        let mut config = ClientConfig::with_flush(2, T);
        config.server_addr = addr.clone();
        let (client, task) =
            ReportingClient::spawn(&config, TcpTransport::new(addr), CancellationToken::new());

        let (a, b) = events_ab();
        client.record(a.clone());
        client.record(b.clone());

        assert_eq!(recv_n(&mut rx, 2).await, vec![a, b]);

        drop(client);
        task.await.unwrap();

        cancel.cancel();
        server.await.unwrap().unwrap();
        assert_eq!(collector.stats().events_accepted, 2);
    }

    /// A malformed envelope rejects the whole batch over TCP; the
    /// connection stays usable
    #[tokio::test]
    async fn test_e2e_tcp_malformed_batch_rejected() {
        let (collector, mut rx) = relay_collector().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(listener, Arc::clone(&collector), cancel.clone()));

        let mut transport = TcpTransport::new(addr);
        let good = encode(&ServerEvent::login("srv").into()).unwrap();
        let bad = Envelope {
            type_name: "node".into(),
            ..good.clone()
        };

        let err = transport
            .send(RawBatch::new(vec![good.clone(), bad]))
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Rejected { .. }));
        assert!(rx.try_recv().is_err());

        let ack = transport.send(RawBatch::new(vec![good])).await.unwrap();
        assert_eq!(ack.accepted, 1);
        assert_eq!(recv_n(&mut rx, 1).await.len(), 1);

        let stats = collector.stats();
        assert_eq!(stats.batches_rejected, 1);
        assert_eq!(stats.batches_accepted, 1);

        cancel.cancel();
        server.await.unwrap().unwrap();
    }

    /// Applies the batch, then reports failure the first `lost_acks` times
    struct LostAckTransport {
        inner: LocalTransport,
        lost_acks: usize,
    }

    impl BatchTransport for LostAckTransport {
        async fn send(&mut self, batch: RawBatch) -> Result<Ack, SendError> {
            let ack = self.inner.send(batch).await?;
            if self.lost_acks > 0 {
                self.lost_acks -= 1;
                return Err(SendError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "ack lost",
                )));
            }
            Ok(ack)
        }
    }

    /// A retried flush delivers the same ids twice; the durable sink keeps
    /// one row per id
    #[tokio::test(start_paused = true)]
    async fn test_e2e_sqlite_retry_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("events.db");

        let collector = CollectorBuilder::new(vec![SinkConfig::sqlite(
            "warehouse",
            db_path.to_string_lossy(),
        )])
        .build()
        .await
        .unwrap();
        let collector = Arc::new(collector);

        let transport = LostAckTransport {
            inner: LocalTransport::new(Arc::clone(&collector)),
            lost_acks: 1,
        };
        let config = ClientConfig::with_flush(2, T);
        let (client, task) = ReportingClient::spawn(&config, transport, CancellationToken::new());

        let (a, b) = events_ab();
        let c: Event = ServerEvent::login("server-c").into();
        client.record(a.clone());
        client.record(b.clone());
        // Wait for the first (lost) flush before C is queued
        timeout(Duration::from_secs(1), async {
            while client.metrics().snapshot().flush_failures == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(client.metrics().snapshot().flushes, 0);

        client.record(c.clone());
        let metrics = Arc::clone(client.metrics());
        drop(client);
        task.await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_sent, 3);
        assert_eq!(snapshot.pending, 0);
        assert_eq!(collector.stats().events_accepted, 5);

        let collector = Arc::try_unwrap(collector).ok().unwrap();
        collector.shutdown().await;

        let store = SqliteSink::open("check", &db_path).unwrap();
        assert_eq!(store.event_count().unwrap(), 3);
        for event in [&a, &b, &c] {
            assert!(store.contains(event.id()).unwrap());
        }
    }

    /// A configuration file drives the collector's sinks
    #[tokio::test]
    async fn test_config_to_collector() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("events.db");
        let toml = format!(
            r#"
version = "v1"

[server]
listen_addr = "127.0.0.1:0"

[client]
flush_count = 2
flush_interval_ms = 3000

[[sinks]]
name = "log"
sink_type = "log"

[[sinks]]
name = "warehouse"
sink_type = "sqlite"
params = {{ path = "{}" }}
"#,
            db_path.display()
        );

        let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.client.queue_capacity(), 10);

        let collector = CollectorBuilder::new(blueprint.sinks).build().await.unwrap();
        let names: Vec<String> = collector.metrics().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["log", "warehouse"]);

        let (a, b) = events_ab();
        let batch = RawBatch::new(vec![encode(&a).unwrap(), encode(&b).unwrap()]);
        assert_eq!(collector.handle_batch(batch).await.unwrap().accepted, 2);
        collector.shutdown().await;

        let store = SqliteSink::open("check", &db_path).unwrap();
        assert_eq!(store.event_count().unwrap(), 2);
    }
}
