//! MockTransport - scriptable in-memory transport for testing

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{decode_batch, Ack, BatchTransport, Event, RawBatch, SendError};

#[derive(Debug, Default)]
struct MockState {
    attempts: Vec<RawBatch>,
    delivered: Vec<RawBatch>,
    failures_left: usize,
}

/// Transport that records every batch and can be told to fail
///
/// Clones share state, so a test keeps one clone and hands the other to
/// the client.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` sends with a connection error
    pub fn fail_next(&self, n: usize) {
        self.lock().failures_left = n;
    }

    /// Every batch passed to `send`, in call order
    pub fn attempts(&self) -> Vec<RawBatch> {
        self.lock().attempts.clone()
    }

    /// Batches that were acknowledged
    pub fn delivered(&self) -> Vec<RawBatch> {
        self.lock().delivered.clone()
    }

    /// Events of all acknowledged batches, in delivery order
    ///
    /// Envelopes that fail to decode are skipped.
    pub fn delivered_events(&self) -> Vec<Event> {
        self.lock()
            .delivered
            .iter()
            .filter_map(|batch| decode_batch(batch).ok())
            .flatten()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BatchTransport for MockTransport {
    async fn send(&mut self, batch: RawBatch) -> Result<Ack, SendError> {
        let mut state = self.lock();
        state.attempts.push(batch.clone());

        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(SendError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock transport failure",
            )));
        }

        let accepted = batch.len();
        state.delivered.push(batch);
        Ok(Ack { accepted })
    }
}
