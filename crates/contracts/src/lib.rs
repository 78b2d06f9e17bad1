//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the reporting
//! pipeline: the event model, the wire envelope and its codec, the sink and
//! transport traits, errors and configuration.
//!
//! ## Wire Model
//! - Every event travels as an `Envelope` holding a versioned JSON document
//! - Receivers pick a decoder by the envelope's type name
//! - `EventId` is the de-duplication key across retried deliveries
//! - Over TCP, batches travel as length-prefixed bincode frames (`wire`)

mod blueprint;
mod codec;
mod envelope;
mod error;
mod event;
mod event_id;
mod notification;
mod sink;
mod transport;
pub mod wire;

pub use blueprint::*;
pub use codec::{decode, decode_batch, encode};
pub use envelope::*;
pub use error::*;
pub use event::*;
pub use event_id::EventId;
pub use notification::*;
pub use sink::*;
pub use transport::*;
