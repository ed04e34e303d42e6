use serde::{Deserialize, Serialize};
use zine_ref::{AuthorSlug, ReactionId, ShoutSlug, TopicSlug};

use crate::{Layout, ReactionKind};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ShoutsFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layouts: Option<Vec<Layout>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSlug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<TopicSlug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reacted: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct LoadShoutsOptions {
    #[serde(default)]
    pub filters: ShoutsFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_desc: Option<bool>,
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl LoadShoutsOptions {
    pub fn new(limit: u32) -> Self {
        LoadShoutsOptions {
            limit,
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: ShoutsFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn ordered_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_string());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SearchOptions {
    pub text: String,
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionSort {
    Newest,
    Oldest,
    Like,
    Dislike,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ReactionsBy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shout: Option<ShoutSlug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shouts: Option<Vec<ShoutSlug>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<TopicSlug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<ReactionSort>,
}

impl ReactionsBy {
    pub fn shout(slug: ShoutSlug) -> Self {
        ReactionsBy {
            shout: Some(slug),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ReactionsBy::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AuthorsBy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<TopicSlug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ReactionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReactionId>,
    pub kind: ReactionKind,
    pub shout: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}
