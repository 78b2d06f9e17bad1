//! Envelope - transport-neutral wire unit
//!
//! Wraps one serialized resource document together with the discriminator
//! a receiver needs to pick a decoder.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One serialized event plus its discriminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Resource kind ("event")
    pub kind: String,
    /// Resource version ("v2")
    pub version: String,
    /// Variant type name ("server", "user")
    pub type_name: String,
    /// JSON resource document
    pub data: Bytes,
}

/// Ordered batch of envelopes, one RPC call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBatch {
    pub envelopes: Vec<Envelope>,
}

impl RawBatch {
    pub fn new(envelopes: Vec<Envelope>) -> Self {
        Self { envelopes }
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }
}

/// Acknowledgement for a fully applied batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Number of events accepted
    pub accepted: usize,
}
