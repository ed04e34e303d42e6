use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError, DefaultOnNull, VecSkipError};
use zine_ref::ChatId;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ChatMember {
    pub id: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub slug: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub pic: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub online: Option<bool>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: ChatId,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub body: String,
    pub created_by: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub reply_to: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub seen: Option<bool>,
    #[serde(default)]
    pub created_at: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub title: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub description: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub members: Vec<ChatMember>,
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub admins: Vec<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub unread: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub created_by: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MessagesBy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
}

impl MessagesBy {
    pub fn chat(chat_id: ChatId) -> Self {
        MessagesBy {
            chat: Some(chat_id),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CreateMessage {
    pub chat_id: ChatId,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CreateChat {
    pub members: Vec<i64>,
    pub title: String,
}
