//! Notification - control-plane message addressed to an account
//!
//! Shares the versioned resource document with events but uses its own
//! kind, so an event decoder never accepts a notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{parse_document, ResourceDocument};
use crate::{DecodeError, Envelope, KIND_NOTIFICATION, RESOURCE_VERSION};

/// Usage limit notification type
pub const NOTIFICATION_TYPE_USAGE: &str = "usage";
/// Terms of service violation notification type
pub const NOTIFICATION_TYPE_TOS: &str = "tos";

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationSpec {
    /// Account the notification is for
    #[serde(rename = "accountID")]
    pub account_id: String,
    pub severity: Severity,
    /// Plain text body
    pub text: String,
    /// HTML body
    pub html: String,
}

/// A user notification ("usage", "tos", ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    name: String,
    created: DateTime<Utc>,
    spec: NotificationSpec,
}

impl Notification {
    /// Create a notification of the given type created now
    pub fn new(name: impl Into<String>, spec: NotificationSpec) -> Self {
        Self {
            name: name.into(),
            created: Utc::now(),
            spec,
        }
    }

    /// Notification type
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn spec(&self) -> &NotificationSpec {
        &self.spec
    }
}

/// Encode a notification into an envelope
pub fn encode_notification(notification: &Notification) -> Result<Envelope, serde_json::Error> {
    ResourceDocument::new(
        KIND_NOTIFICATION,
        &notification.name,
        notification.created,
        &notification.spec,
    )
    .to_envelope()
}

/// Decode a notification with strict schema validation
pub fn decode_notification(envelope: &Envelope) -> Result<Notification, DecodeError> {
    if envelope.kind != KIND_NOTIFICATION || envelope.version != RESOURCE_VERSION {
        return Err(DecodeError::UnknownKind {
            kind: envelope.kind.clone(),
            version: envelope.version.clone(),
        });
    }
    let doc: ResourceDocument<NotificationSpec> = parse_document(envelope)?;
    Ok(Notification {
        name: doc.metadata.name,
        created: doc.metadata.created,
        spec: doc.spec,
    })
}
