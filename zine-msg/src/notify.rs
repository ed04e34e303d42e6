use serde::{Deserialize, Serialize};
use serde_json::{from_value, Value};
use serde_with::{serde_as, DefaultOnError, DefaultOnNull, VecSkipError};

use crate::{Author, Chat, Message, Reaction, Shout};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Notification {
    pub id: i64,
    pub entity: String,
    pub action: String,
    /// Json encoded entity, a reaction when `entity` is "reaction".
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub created_at: i64,
    /// Author ids that have seen this notification.
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub seen: Vec<i64>,
}

impl Notification {
    pub fn is_reaction(&self) -> bool {
        self.entity == "reaction"
    }

    pub fn reaction(&self) -> Result<Option<Reaction>, serde_json::Error> {
        if !self.is_reaction() {
            return Ok(None);
        }
        serde_json::from_str(&self.payload).map(Some)
    }

    pub fn is_seen_by(&self, author_id: i64) -> bool {
        self.seen.contains(&author_id)
    }

    pub fn mark_seen_by(&mut self, author_id: i64) {
        if !self.is_seen_by(author_id) {
            self.seen.push(author_id);
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct NotificationsResult {
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub unread: i64,
}

/// A server sent event as pushed over the real-time channel.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SseMessage {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub id: Option<String>,
    pub entity: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub payload: Value,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub seen: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventContent {
    Reaction(Reaction),
    Shout(Shout),
    Follower(Author),
    Message(Message),
    Chat(Chat),
    Unknown,
}

impl SseMessage {
    /// Decodes the payload by entity tag. Malformed or unrecognised payloads are `Unknown`.
    pub fn content(&self) -> EventContent {
        let payload = self.payload.clone();
        let content = match self.entity.as_str() {
            "reaction" => from_value(payload).map(EventContent::Reaction),
            "shout" => from_value(payload).map(EventContent::Shout),
            "follower" => from_value(payload).map(EventContent::Follower),
            "message" => from_value(payload).map(EventContent::Message),
            "chat" => from_value(payload).map(EventContent::Chat),
            _ => return EventContent::Unknown,
        };
        content.unwrap_or(EventContent::Unknown)
    }
}
