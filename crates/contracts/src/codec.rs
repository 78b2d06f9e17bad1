//! Event codec
//!
//! Converts events to and from envelopes. The payload is a versioned JSON
//! resource document; decoding is strict (no missing fields, no unknown
//! fields at any level) and dispatches on the envelope's type name through
//! a static decoder table.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{
    DecodeError, EncodeError, Envelope, Event, EventId, RawBatch, ServerEvent, UserEvent,
    EVENT_TYPE_SERVER, EVENT_TYPE_USER, KIND_EVENT, RESOURCE_VERSION,
};

/// Versioned resource document carried in `Envelope::data`
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ResourceDocument<S> {
    pub kind: String,
    pub version: String,
    pub metadata: ResourceMetadata,
    pub spec: S,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ResourceMetadata {
    pub name: String,
    pub created: DateTime<Utc>,
}

impl<S: Serialize> ResourceDocument<S> {
    pub(crate) fn new(kind: &str, name: &str, created: DateTime<Utc>, spec: S) -> Self {
        Self {
            kind: kind.to_string(),
            version: RESOURCE_VERSION.to_string(),
            metadata: ResourceMetadata {
                name: name.to_string(),
                created,
            },
            spec,
        }
    }

    /// Serialize into an envelope tagged with this document's discriminator
    pub(crate) fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        let data = serde_json::to_vec(self)?;
        Ok(Envelope {
            kind: self.kind.clone(),
            version: self.version.clone(),
            type_name: self.metadata.name.clone(),
            data: Bytes::from(data),
        })
    }
}

/// Parse a document strictly and check it agrees with its envelope
pub(crate) fn parse_document<S: DeserializeOwned>(
    envelope: &Envelope,
) -> Result<ResourceDocument<S>, DecodeError> {
    let doc: ResourceDocument<S> = serde_json::from_slice(&envelope.data)
        .map_err(|e| DecodeError::malformed(&envelope.type_name, e.to_string()))?;

    if doc.kind != envelope.kind
        || doc.version != envelope.version
        || doc.metadata.name != envelope.type_name
    {
        return Err(DecodeError::malformed(
            &envelope.type_name,
            format!(
                "payload discriminator {}/{}/{} does not match envelope {}/{}/{}",
                doc.kind,
                doc.version,
                doc.metadata.name,
                envelope.kind,
                envelope.version,
                envelope.type_name
            ),
        ));
    }
    Ok(doc)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerEventSpec {
    id: EventId,
    action: String,
    #[serde(rename = "accountID")]
    account_id: String,
    #[serde(rename = "serverID")]
    server_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserEventSpec {
    id: EventId,
    action: String,
    #[serde(rename = "accountID")]
    account_id: String,
    #[serde(rename = "userID")]
    user_id: String,
}

type DecodeFn = fn(&Envelope) -> Result<Event, DecodeError>;

/// Type name -> decoder
const DECODERS: &[(&str, DecodeFn)] = &[
    (EVENT_TYPE_SERVER, decode_server),
    (EVENT_TYPE_USER, decode_user),
];

fn decoder_for(type_name: &str) -> Option<DecodeFn> {
    DECODERS
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, decode)| *decode)
}

/// Encode an event into an envelope
pub fn encode(event: &Event) -> Result<Envelope, EncodeError> {
    let result = match event {
        Event::Server(e) => ResourceDocument::new(
            KIND_EVENT,
            EVENT_TYPE_SERVER,
            e.created(),
            ServerEventSpec {
                id: *e.id(),
                action: e.action().to_string(),
                account_id: e.account_id().to_string(),
                server_id: e.server_id().to_string(),
            },
        )
        .to_envelope(),
        Event::User(e) => ResourceDocument::new(
            KIND_EVENT,
            EVENT_TYPE_USER,
            e.created(),
            UserEventSpec {
                id: *e.id(),
                action: e.action().to_string(),
                account_id: e.account_id().to_string(),
                user_id: e.user_id().to_string(),
            },
        )
        .to_envelope(),
    };

    result.map_err(|source| EncodeError {
        type_name: event.type_name(),
        event_id: *event.id(),
        source,
    })
}

/// Decode a single envelope
///
/// # Errors
/// - `UnknownKind` if kind/version is not `event`/`v2`
/// - `UnknownType` if the type name has no decoder
/// - `Malformed` if the payload fails schema validation
pub fn decode(envelope: &Envelope) -> Result<Event, DecodeError> {
    if envelope.kind != KIND_EVENT || envelope.version != RESOURCE_VERSION {
        return Err(DecodeError::UnknownKind {
            kind: envelope.kind.clone(),
            version: envelope.version.clone(),
        });
    }

    let decode = decoder_for(&envelope.type_name).ok_or_else(|| DecodeError::UnknownType {
        type_name: envelope.type_name.clone(),
    })?;
    decode(envelope)
}

/// Decode a whole batch, all or nothing
///
/// The first failing envelope aborts the batch; no partially decoded
/// events are returned.
pub fn decode_batch(batch: &RawBatch) -> Result<Vec<Event>, DecodeError> {
    batch.envelopes.iter().map(decode).collect()
}

fn decode_server(envelope: &Envelope) -> Result<Event, DecodeError> {
    let doc: ResourceDocument<ServerEventSpec> = parse_document(envelope)?;
    Ok(ServerEvent::from_parts(
        doc.spec.id,
        doc.spec.action,
        doc.spec.account_id,
        doc.spec.server_id,
        doc.metadata.created,
    )
    .into())
}

fn decode_user(envelope: &Envelope) -> Result<Event, DecodeError> {
    let doc: ResourceDocument<UserEventSpec> = parse_document(envelope)?;
    Ok(UserEvent::from_parts(
        doc.spec.id,
        doc.spec.action,
        doc.spec.account_id,
        doc.spec.user_id,
        doc.metadata.created,
    )
    .into())
}
