//! TCP wire framing shared by the client transport and the collector server
//!
//! A frame is a `u32` big-endian body length followed by a bincode body.
//! Requests carry a `RawBatch`, responses a `Reply`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Ack;

/// Largest accepted frame body
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Length prefix size
pub const FRAME_HEADER_LEN: usize = 4;

/// Collector answer to one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Ack(Ack),
    Error(String),
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    TooLarge { len: usize, max: usize },

    #[error("bincode error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Serialize `value` into a length-prefixed frame
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    let body = bincode::serialize(value)?;
    check_frame_len(body.len())?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Deserialize a frame body (without the length prefix)
pub fn decode_frame<T: DeserializeOwned>(body: &[u8]) -> Result<T, WireError> {
    Ok(bincode::deserialize(body)?)
}

/// Reject a declared body length before reading it
pub fn check_frame_len(len: usize) -> Result<(), WireError> {
    if len > MAX_FRAME_LEN {
        return Err(WireError::TooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    Ok(())
}
