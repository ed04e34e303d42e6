use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError, DefaultOnNull, VecSkipError};
use std::fmt;
use zine_ref::{AuthorSlug, ReactionId, ShoutSlug, TopicSlug};

mod auth;
mod inbox;
mod notify;
mod options;
mod stat;

pub use auth::*;
pub use inbox::*;
pub use notify::*;
pub use options::*;
pub use stat::*;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Author {
    #[serde(default)]
    pub id: i64,
    pub slug: AuthorSlug,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub bio: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub about: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub pic: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub stat: Option<AuthorStat>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub last_seen: Option<i64>,
}

impl Author {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.slug.as_str())
    }
}

impl HasStat for Author {
    fn stat_value(&self, metric: Metric) -> i64 {
        stat_or_zero(&self.stat, metric)
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Topic {
    #[serde(default)]
    pub id: i64,
    pub slug: TopicSlug,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub title: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub body: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub pic: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub stat: Option<TopicStat>,
}

impl Topic {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.slug.as_str())
    }
}

impl HasStat for Topic {
    fn stat_value(&self, metric: Metric) -> i64 {
        stat_or_zero(&self.stat, metric)
    }
}

/// Media kind of a shout. Unrecognised values are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Layout {
    Article,
    Audio,
    Video,
    Image,
    Literature,
    Other(String),
}

impl Layout {
    pub fn as_str(&self) -> &str {
        match self {
            Layout::Article => "article",
            Layout::Audio => "audio",
            Layout::Video => "video",
            Layout::Image => "image",
            Layout::Literature => "literature",
            Layout::Other(other) => other.as_str(),
        }
    }

    pub fn expo() -> [Layout; 4] {
        [Layout::Audio, Layout::Literature, Layout::Video, Layout::Image]
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Article
    }
}

impl From<String> for Layout {
    fn from(value: String) -> Self {
        match value.as_str() {
            "article" | "" => Layout::Article,
            "audio" | "music" => Layout::Audio,
            "video" => Layout::Video,
            "image" => Layout::Image,
            "literature" => Layout::Literature,
            _ => Layout::Other(value),
        }
    }
}

impl From<Layout> for String {
    fn from(value: Layout) -> String {
        value.as_str().to_string()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Shout {
    #[serde(default)]
    pub id: i64,
    pub slug: ShoutSlug,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub title: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub lead: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub description: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub body: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub layout: Layout,
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub main_topic: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub cover: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub stat: Option<Stat>,
    #[serde(default)]
    pub created_at: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub published_at: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub featured_at: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub created_by: Option<Author>,
}

impl Shout {
    pub fn to_ref(&self) -> ShoutRef {
        ShoutRef {
            id: Some(self.id),
            slug: self.slug.clone(),
            title: Some(self.title.clone()),
        }
    }
}

impl HasStat for Shout {
    fn stat_value(&self, metric: Metric) -> i64 {
        stat_or_zero(&self.stat, metric)
    }
}

/// The part of a shout embedded in reactions and notification payloads.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ShoutRef {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub id: Option<i64>,
    pub slug: ShoutSlug,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionKind {
    Accept,
    Agree,
    Ask,
    Comment,
    Disagree,
    Dislike,
    Disproof,
    Like,
    Proof,
    Propose,
    Quote,
    Reject,
}

impl ReactionKind {
    /// The vote that a new vote of this kind replaces.
    pub fn opposite_vote(&self) -> Option<ReactionKind> {
        match self {
            ReactionKind::Like => Some(ReactionKind::Dislike),
            ReactionKind::Dislike => Some(ReactionKind::Like),
            _ => None,
        }
    }

    pub fn is_vote(&self) -> bool {
        self.opposite_vote().is_some()
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Reaction {
    pub id: ReactionId,
    pub kind: ReactionKind,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub body: Option<String>,
    pub created_by: Author,
    pub shout: ShoutRef,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub reply_to: Option<ReactionId>,
    #[serde(default)]
    pub created_at: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub deleted_at: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Community {
    #[serde(default)]
    pub id: i64,
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowingEntity {
    Author,
    Topic,
    Community,
    Shout,
}

impl fmt::Display for FollowingEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FollowingEntity::Author => "author",
            FollowingEntity::Topic => "topic",
            FollowingEntity::Community => "community",
            FollowingEntity::Shout => "shout",
        };
        f.write_str(s)
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Subscriptions {
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde_as(deserialize_as = "DefaultOnNull<VecSkipError<_>>")]
    #[serde(default)]
    pub communities: Vec<Community>,
}

/// An unpublished shout kept on the client.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Draft {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub id: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub slug: Option<ShoutSlug>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub title: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub updated_at: i64,
}
