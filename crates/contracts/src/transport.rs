//! BatchTransport trait - client-to-collector RPC
//!
//! One method: submit a batch of envelopes, get an acknowledgement or an
//! error back. Security and connection management live in the
//! implementation.

use crate::{Ack, RawBatch, SendError};

/// Batch submission channel
#[trait_variant::make(BatchTransport: Send)]
pub trait LocalBatchTransport {
    /// Deliver one batch and wait for the collector's answer
    async fn send(&mut self, batch: RawBatch) -> Result<Ack, SendError>;
}
