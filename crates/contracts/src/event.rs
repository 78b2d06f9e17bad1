//! Event - producer-side data model
//!
//! Events are immutable once constructed. Fields are private; the only way
//! to change anything is to consume the value and build a new one
//! (`with_account_id`).

use chrono::{DateTime, Utc};

use crate::EventId;

/// Resource kind of every event document
pub const KIND_EVENT: &str = "event";
/// Resource kind of user notifications
pub const KIND_NOTIFICATION: &str = "notification";
/// Current resource version (events and notifications)
pub const RESOURCE_VERSION: &str = "v2";

/// Server-related event type name
pub const EVENT_TYPE_SERVER: &str = "server";
/// User-related event type name
pub const EVENT_TYPE_USER: &str = "user";

/// Login action
pub const EVENT_ACTION_LOGIN: &str = "login";

/// Fields shared by every event variant
#[derive(Debug, Clone, PartialEq, Eq)]
struct EventCore {
    id: EventId,
    action: String,
    account_id: String,
    created: DateTime<Utc>,
}

impl EventCore {
    fn new(action: String) -> Self {
        Self {
            id: EventId::random(),
            action,
            account_id: String::new(),
            created: Utc::now(),
        }
    }
}

/// Server-related event, such as "logged into server"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    core: EventCore,
    server_id: String,
}

impl ServerEvent {
    /// Create a server event with a fresh id and the current time
    pub fn new(action: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self {
            core: EventCore::new(action.into()),
            server_id: server_id.into(),
        }
    }

    /// "server login" event
    pub fn login(server_id: impl Into<String>) -> Self {
        Self::new(EVENT_ACTION_LOGIN, server_id)
    }

    /// Rebuild an event from decoded parts
    pub(crate) fn from_parts(
        id: EventId,
        action: String,
        account_id: String,
        server_id: String,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            core: EventCore {
                id,
                action,
                account_id,
                created,
            },
            server_id,
        }
    }

    pub fn id(&self) -> &EventId {
        &self.core.id
    }

    pub fn action(&self) -> &str {
        &self.core.action
    }

    pub fn account_id(&self) -> &str {
        &self.core.account_id
    }

    /// Anonymized id of the server that triggered the event
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.core.created
    }
}

/// User-related event, such as "user logged in"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEvent {
    core: EventCore,
    user_id: String,
}

impl UserEvent {
    /// Create a user event with a fresh id and the current time
    pub fn new(action: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            core: EventCore::new(action.into()),
            user_id: user_id.into(),
        }
    }

    /// "user login" event
    pub fn login(user_id: impl Into<String>) -> Self {
        Self::new(EVENT_ACTION_LOGIN, user_id)
    }

    pub(crate) fn from_parts(
        id: EventId,
        action: String,
        account_id: String,
        user_id: String,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            core: EventCore {
                id,
                action,
                account_id,
                created,
            },
            user_id,
        }
    }

    pub fn id(&self) -> &EventId {
        &self.core.id
    }

    pub fn action(&self) -> &str {
        &self.core.action
    }

    pub fn account_id(&self) -> &str {
        &self.core.account_id
    }

    /// Anonymized id of the user that triggered the event
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.core.created
    }
}

/// Any reportable event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Server(ServerEvent),
    User(UserEvent),
}

impl Event {
    fn core(&self) -> &EventCore {
        match self {
            Event::Server(e) => &e.core,
            Event::User(e) => &e.core,
        }
    }

    /// Unique id, stable across retried deliveries
    pub fn id(&self) -> &EventId {
        &self.core().id
    }

    /// Type discriminator used on the wire ("server", "user")
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Server(_) => EVENT_TYPE_SERVER,
            Event::User(_) => EVENT_TYPE_USER,
        }
    }

    pub fn action(&self) -> &str {
        &self.core().action
    }

    pub fn account_id(&self) -> &str {
        &self.core().account_id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.core().created
    }

    pub fn server_id(&self) -> Option<&str> {
        match self {
            Event::Server(e) => Some(&e.server_id),
            Event::User(_) => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Event::Server(_) => None,
            Event::User(e) => Some(&e.user_id),
        }
    }

    /// Decorate the event with the account it belongs to
    ///
    /// Consumes the event; the id and timestamp are kept, so a decorated
    /// event still de-duplicates against the undecorated original.
    pub fn with_account_id(self, account_id: impl Into<String>) -> Self {
        let account_id = account_id.into();
        match self {
            Event::Server(mut e) => {
                e.core.account_id = account_id;
                Event::Server(e)
            }
            Event::User(mut e) => {
                e.core.account_id = account_id;
                Event::User(e)
            }
        }
    }
}

impl From<ServerEvent> for Event {
    fn from(event: ServerEvent) -> Self {
        Event::Server(event)
    }
}

impl From<UserEvent> for Event {
    fn from(event: UserEvent) -> Self {
        Event::User(event)
    }
}
