//! LocalTransport - in-process client-to-collector channel

use std::sync::Arc;

use contracts::{Ack, BatchTransport, RawBatch, SendError};

use crate::collector::Collector;

/// Delivers batches straight to a collector in the same process
#[derive(Clone)]
pub struct LocalTransport {
    collector: Arc<Collector>,
}

impl LocalTransport {
    pub fn new(collector: Arc<Collector>) -> Self {
        Self { collector }
    }
}

impl BatchTransport for LocalTransport {
    async fn send(&mut self, batch: RawBatch) -> Result<Ack, SendError> {
        self.collector
            .handle_batch(batch)
            .await
            .map_err(|e| SendError::rejected(e.to_string()))
    }
}
