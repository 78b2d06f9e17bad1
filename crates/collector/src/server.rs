//! TCP front end for the collector
//!
//! One task per connection. Each request frame carries a bincode
//! `RawBatch`; each reply frame a bincode `Reply`. Frames are processed one
//! at a time per connection, in arrival order.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use contracts::wire::{check_frame_len, decode_frame, encode_frame, Reply};
use contracts::RawBatch;

use crate::collector::Collector;

/// Accept connections until `cancel` fires
///
/// Waits for open connections to finish their current frame before
/// returning.
#[instrument(name = "collector_serve", skip_all)]
pub async fn serve(
    listener: TcpListener,
    collector: Arc<Collector>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "Collector listening");

    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "Connection accepted");
                    connections.spawn(handle_connection(
                        stream,
                        peer,
                        Arc::clone(&collector),
                        cancel.clone(),
                    ));
                }
                Err(e) => warn!(error = %e, "Accept failed"),
            },

            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = joined {
                    error!(error = ?e, "Connection task panicked");
                }
            }
        }
    }

    while let Some(joined) = connections.join_next().await {
        if let Err(e) = joined {
            error!(error = ?e, "Connection task panicked");
        }
    }

    info!("Collector listener stopped");
    Ok(())
}

#[instrument(
    name = "collector_connection",
    skip(stream, collector, cancel),
    fields(peer = %peer)
)]
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    collector: Arc<Collector>,
    cancel: CancellationToken,
) {
    loop {
        let body = tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            frame = read_frame(&mut stream) => match frame {
                Ok(Some(body)) => body,
                Ok(None) => {
                    debug!("Connection closed by peer");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Dropping connection");
                    break;
                }
            },
        };

        let reply = match decode_frame::<RawBatch>(&body) {
            Ok(batch) => match collector.handle_batch(batch).await {
                Ok(ack) => Reply::Ack(ack),
                Err(e) => Reply::Error(e.to_string()),
            },
            Err(e) => Reply::Error(format!("invalid batch frame: {e}")),
        };

        if let Err(e) = write_reply(&mut stream, &reply).await {
            warn!(error = %e, "Failed to write reply");
            break;
        }
    }
}

/// Read one frame body; `None` on a clean close between frames
async fn read_frame(stream: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
    let len = match stream.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    check_frame_len(len).map_err(invalid_data)?;

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    Ok(Some(body))
}

async fn write_reply(stream: &mut TcpStream, reply: &Reply) -> std::io::Result<()> {
    let frame = encode_frame(reply).map_err(invalid_data)?;
    stream.write_all(&frame).await?;
    stream.flush().await
}

fn invalid_data(e: impl std::error::Error + Send + Sync + 'static) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
}
