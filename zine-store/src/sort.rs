use std::{cmp::Ordering, str::FromStr};
use zine_msg::{Author, HasStat, Metric, Topic};

/// Sorts descending by `stat[metric]`, missing stats counting as 0. Ties keep their order.
pub fn sort_by_stat<T: HasStat>(items: &mut [T], metric: Metric) {
    items.sort_by(|a, b| by_stat_desc(a, b, metric));
}

pub fn by_stat_desc<T: HasStat>(a: &T, b: &T, metric: Metric) -> Ordering {
    b.stat_value(metric).cmp(&a.stat_value(metric))
}

/// The first `limit` items by descending `stat[metric]`.
pub fn top_by_stat<T: HasStat + Clone>(items: &[T], metric: Metric, limit: usize) -> Vec<T> {
    let mut sorted = items.to_vec();
    sort_by_stat(&mut sorted, metric);
    sorted.truncate(limit);
    sorted
}

/// Case-insensitive comparison used for name and title orderings.
pub fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorsSortBy {
    Created,
    Name,
    Stat(Metric),
}

impl Default for AuthorsSortBy {
    fn default() -> Self {
        AuthorsSortBy::Created
    }
}

impl FromStr for AuthorsSortBy {
    type Err = zine_msg::UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(AuthorsSortBy::Created),
            "name" => Ok(AuthorsSortBy::Name),
            other => other.parse().map(AuthorsSortBy::Stat),
        }
    }
}

pub fn sort_authors(authors: &mut [Author], sort_by: AuthorsSortBy) {
    match sort_by {
        AuthorsSortBy::Created => {
            authors.sort_by_key(|author| author.created_at.unwrap_or(0));
        }
        AuthorsSortBy::Name => {
            authors.sort_by(|a, b| by_name(a.display_name(), b.display_name()));
        }
        AuthorsSortBy::Stat(metric) => sort_by_stat(authors, metric),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopicsSortBy {
    Shouts,
    Followers,
    Authors,
    Title,
}

impl Default for TopicsSortBy {
    fn default() -> Self {
        TopicsSortBy::Shouts
    }
}

impl TopicsSortBy {
    /// Unknown names fall back to sorting by shouts.
    pub fn from_name(name: &str) -> Self {
        match name {
            "followers" => TopicsSortBy::Followers,
            "authors" => TopicsSortBy::Authors,
            "title" => TopicsSortBy::Title,
            _ => TopicsSortBy::Shouts,
        }
    }
}

pub fn sort_topics(topics: &mut [Topic], sort_by: TopicsSortBy) {
    match sort_by {
        TopicsSortBy::Shouts => sort_by_stat(topics, Metric::Shouts),
        TopicsSortBy::Followers => sort_by_stat(topics, Metric::Followers),
        TopicsSortBy::Authors => sort_by_stat(topics, Metric::Authors),
        TopicsSortBy::Title => {
            topics.sort_by(|a, b| {
                by_name(
                    a.title.as_deref().unwrap_or(""),
                    b.title.as_deref().unwrap_or(""),
                )
            });
        }
    }
}
