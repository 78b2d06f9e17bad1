//! TcpTransport - framed bincode RPC to a collector

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use contracts::wire::{check_frame_len, decode_frame, encode_frame, Reply};
use contracts::{Ack, BatchTransport, RawBatch, SendError};

/// Default time allowed for one request/reply exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client end of the collector's TCP protocol
///
/// Connects on first use and drops the connection after any I/O or
/// framing failure; the next send reconnects. The request timeout bounds
/// the connect and the request/reply exchange separately.
pub struct TcpTransport {
    addr: String,
    request_timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stream: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn connection(&mut self) -> Result<&mut TcpStream, SendError> {
        if self.stream.is_none() {
            let connect = TcpStream::connect(&self.addr);
            let stream = match tokio::time::timeout(self.request_timeout, connect).await {
                Ok(connected) => connected,
                Err(_) => Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect timed out after {:?}", self.request_timeout),
                )),
            }
            .map_err(|source| SendError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
            stream.set_nodelay(true)?;
            debug!(addr = %self.addr, "Connected to collector");
            self.stream = Some(stream);
        }
        self.stream.as_mut().ok_or(SendError::Closed)
    }

    async fn exchange(stream: &mut TcpStream, frame: &[u8]) -> Result<Reply, SendError> {
        stream.write_all(frame).await?;
        stream.flush().await?;

        let len = stream.read_u32().await? as usize;
        check_frame_len(len).map_err(|e| SendError::codec(e.to_string()))?;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await?;

        decode_frame(&body).map_err(|e| SendError::codec(e.to_string()))
    }
}

impl BatchTransport for TcpTransport {
    #[instrument(
        name = "tcp_transport_send",
        skip(self, batch),
        fields(addr = %self.addr, envelopes = batch.len())
    )]
    async fn send(&mut self, batch: RawBatch) -> Result<Ack, SendError> {
        let frame = encode_frame(&batch).map_err(|e| SendError::codec(e.to_string()))?;
        let timeout = self.request_timeout;
        let stream = self.connection().await?;

        let result = match tokio::time::timeout(timeout, Self::exchange(stream, &frame)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no reply within {timeout:?}"),
            ))),
        };

        match result {
            Ok(Reply::Ack(ack)) => Ok(ack),
            Ok(Reply::Error(message)) => Err(SendError::rejected(message)),
            Err(e) => {
                warn!(error = %e, "Dropping collector connection");
                self.stream = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::wire::FRAME_HEADER_LEN;
    use contracts::{encode, ServerEvent};
    use tokio::net::TcpListener;

    /// Accept one connection and answer every frame with `reply`
    async fn fake_collector(reply: Reply) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            loop {
                let Ok(len) = stream.read_u32().await else {
                    return;
                };
                let mut body = vec![0u8; len as usize];
                stream.read_exact(&mut body).await.unwrap();
                let _: RawBatch = decode_frame(&body).unwrap();
                stream
                    .write_all(&encode_frame(&reply).unwrap())
                    .await
                    .unwrap();
            }
        });
        addr
    }

    fn batch() -> RawBatch {
        RawBatch::new(vec![encode(&ServerEvent::login("srv").into()).unwrap()])
    }

    #[tokio::test]
    async fn test_send_ack() {
        let addr = fake_collector(Reply::Ack(Ack { accepted: 1 })).await;
        let mut transport = TcpTransport::new(addr);

        assert!(!transport.is_connected());
        assert_eq!(transport.send(batch()).await.unwrap().accepted, 1);
        assert!(transport.is_connected());
        // Connection is reused
        assert_eq!(transport.send(batch()).await.unwrap().accepted, 1);
    }

    #[tokio::test]
    async fn test_send_rejected_keeps_connection() {
        let addr = fake_collector(Reply::Error("bad batch".into())).await;
        let mut transport = TcpTransport::new(addr);

        let err = transport.send(batch()).await.unwrap_err();
        assert!(matches!(err, SendError::Rejected { ref message } if message == "bad batch"));
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut transport = TcpTransport::new(addr);
        let err = transport.send(batch()).await.unwrap_err();
        assert!(matches!(err, SendError::Connect { .. }));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_connection_dropped_on_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            // Read the header, then hang up without replying
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut header = [0u8; FRAME_HEADER_LEN];
            let _ = stream.read_exact(&mut header).await;
        });

        let mut transport = TcpTransport::new(addr);
        let err = transport.send(batch()).await.unwrap_err();
        assert!(matches!(err, SendError::Io(_)));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_connect_is_bounded_by_request_timeout() {
        // Non-routable address: the SYN goes nowhere
        let mut transport = TcpTransport::new("10.255.255.1:10000")
            .with_request_timeout(Duration::from_millis(200));

        let start = std::time::Instant::now();
        let err = transport.send(batch()).await.unwrap_err();
        assert!(matches!(err, SendError::Connect { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!transport.is_connected());
    }
}
