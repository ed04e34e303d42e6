use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

/// Counter names shared by shout, author and topic stat blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Viewed,
    Rating,
    Commented,
    Reacted,
    Ranking,
    LastComment,
    Shouts,
    Followers,
    Comments,
    Authors,
    RatingShouts,
    RatingComments,
}

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Viewed => "viewed",
            Metric::Rating => "rating",
            Metric::Commented => "commented",
            Metric::Reacted => "reacted",
            Metric::Ranking => "ranking",
            Metric::LastComment => "last_comment",
            Metric::Shouts => "shouts",
            Metric::Followers => "followers",
            Metric::Comments => "comments",
            Metric::Authors => "authors",
            Metric::RatingShouts => "rating_shouts",
            Metric::RatingComments => "rating_comments",
        }
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let metric = match s {
            "viewed" => Metric::Viewed,
            "rating" => Metric::Rating,
            "commented" => Metric::Commented,
            "reacted" => Metric::Reacted,
            "ranking" => Metric::Ranking,
            "last_comment" => Metric::LastComment,
            "shouts" => Metric::Shouts,
            "followers" => Metric::Followers,
            "comments" => Metric::Comments,
            "authors" => Metric::Authors,
            "rating_shouts" => Metric::RatingShouts,
            "rating_comments" => Metric::RatingComments,
            _ => return Err(UnknownMetric(s.to_string())),
        };
        Ok(metric)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stat block that can be read by metric name.
pub trait StatBlock {
    fn get(&self, metric: Metric) -> Option<i64>;
}

/// Entities carrying an optional stat block.
pub trait HasStat {
    fn stat_value(&self, metric: Metric) -> i64;
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Stat {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub viewed: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub commented: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub reacted: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub ranking: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub last_comment: Option<i64>,
}

impl StatBlock for Stat {
    fn get(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::Viewed => self.viewed,
            Metric::Rating => self.rating,
            Metric::Commented => self.commented,
            Metric::Reacted => self.reacted,
            Metric::Ranking => self.ranking,
            Metric::LastComment => self.last_comment,
            _ => None,
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AuthorStat {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub shouts: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub followers: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub comments: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub authors: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub viewed: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub rating_shouts: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub rating_comments: Option<i64>,
}

impl StatBlock for AuthorStat {
    fn get(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::Shouts => self.shouts,
            Metric::Followers => self.followers,
            Metric::Comments => self.comments,
            Metric::Rating => self.rating,
            Metric::Authors => self.authors,
            Metric::Viewed => self.viewed,
            Metric::RatingShouts => self.rating_shouts,
            Metric::RatingComments => self.rating_comments,
            _ => None,
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TopicStat {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub shouts: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub authors: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub followers: Option<i64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub comments: Option<i64>,
}

impl StatBlock for TopicStat {
    fn get(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::Shouts => self.shouts,
            Metric::Authors => self.authors,
            Metric::Followers => self.followers,
            Metric::Comments => self.comments,
            _ => None,
        }
    }
}

pub(crate) fn stat_or_zero<S: StatBlock>(stat: &Option<S>, metric: Metric) -> i64 {
    stat.as_ref()
        .and_then(|stat| stat.get(metric))
        .unwrap_or(0)
}
