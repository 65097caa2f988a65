//! User lifecycle events from the external profile service.
//!
//! Events arrive as JSON with an `eventType` discriminator:
//!
//! | eventType | Effect |
//! |-----------|--------|
//! | `USER_CREATE` | upsert the `:User` node |
//! | `USER_UPDATED` | overwrite the user's attributes (`NotFound` if absent) |
//! | `USER_DELETED` | detach-delete the user (`NotFound` if absent) |
//!
//! Anything else is ignored and reported as `IngestOutcome::Ignored`.

use serde::Deserialize;
use tracing::info;

use crate::model::{Label, NodeId, PropertyMap, Value};
use crate::storage::GraphStore;
use crate::{Error, Result};

pub const USER_CREATE: &str = "USER_CREATE";
pub const USER_UPDATED: &str = "USER_UPDATED";
pub const USER_DELETED: &str = "USER_DELETED";

/// User ids arrive as JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(i64),
    Text(String),
}

impl ExternalId {
    pub fn to_node_id(&self) -> NodeId {
        match self {
            ExternalId::Number(n) => NodeId(n.to_string()),
            ExternalId::Text(s) => NodeId(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub user_id: ExternalId,
    pub first_name: String,
    pub last_name: String,
    pub profil: Profile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub information: ProfileInformation,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileInformation {
    pub gender: String,
    pub age: i64,
    pub orientation: String,
}

impl UserPayload {
    /// Attributes stored on the `:User` node.
    pub fn to_properties(&self) -> PropertyMap {
        let info = &self.profil.information;
        let mut props = PropertyMap::new();
        props.insert("name".into(), Value::from(format!("{} {}", self.first_name, self.last_name)));
        props.insert("gender".into(), Value::from(capitalize(&info.gender)));
        props.insert("age".into(), Value::from(info.age));
        props.insert("orientation".into(), Value::from(capitalize(&info.orientation)));
        props
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: ExternalId,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "eventType")]
    event_type: Option<String>,
}

/// A decoded user event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    Create(UserPayload),
    Update(UserPayload),
    Delete(UserRef),
    /// Unknown or missing `eventType`.
    Other(String),
}

impl UserEvent {
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let envelope: Envelope = serde_json::from_value(value.clone())?;

        Ok(match envelope.event_type.as_deref() {
            Some(USER_CREATE) => UserEvent::Create(serde_json::from_value(value)?),
            Some(USER_UPDATED) => UserEvent::Update(serde_json::from_value(value)?),
            Some(USER_DELETED) => UserEvent::Delete(serde_json::from_value(value)?),
            other => UserEvent::Other(other.unwrap_or_default().to_owned()),
        })
    }
}

/// What applying an event did to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Created(NodeId),
    Updated(NodeId),
    Deleted(NodeId),
    Ignored(String),
}

/// Apply one event to the store.
pub async fn apply_event<S: GraphStore>(store: &S, event: UserEvent) -> Result<IngestOutcome> {
    let outcome = match event {
        UserEvent::Create(payload) => {
            let id = payload.user_id.to_node_id();
            if store.merge_node(Label::User, &id, payload.to_properties()).await? {
                IngestOutcome::Created(id)
            } else {
                IngestOutcome::Updated(id)
            }
        }
        UserEvent::Update(payload) => {
            let id = payload.user_id.to_node_id();
            if !store.exists(&id, Label::User).await? {
                return Err(Error::NotFound(format!("User {id}")));
            }
            store.merge_node(Label::User, &id, payload.to_properties()).await?;
            IngestOutcome::Updated(id)
        }
        UserEvent::Delete(user) => {
            let id = user.user_id.to_node_id();
            if !store.detach_delete_node(Label::User, &id).await? {
                return Err(Error::NotFound(format!("User {id}")));
            }
            IngestOutcome::Deleted(id)
        }
        UserEvent::Other(event_type) => {
            info!(event_type = %event_type, "ignoring unknown user event");
            return Ok(IngestOutcome::Ignored(event_type));
        }
    };

    info!(?outcome, "applied user event");
    Ok(outcome)
}

/// Decode and apply a raw JSON event.
pub async fn apply_json<S: GraphStore>(store: &S, raw: &str) -> Result<IngestOutcome> {
    apply_event(store, UserEvent::from_json(raw)?).await
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
