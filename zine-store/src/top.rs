use chrono::{Datelike, TimeZone, Utc};
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use zine_msg::{Author, Metric, Shout, Topic};

use crate::sort::top_by_stat;

pub const TOP_SIZE: usize = 5;

/// Top lists computed from one batch of shouts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Tops {
    pub topics: Vec<Topic>,
    pub authors: Vec<Author>,
    pub viewed: Vec<Shout>,
    pub commented: Vec<Shout>,
    pub reacted: Vec<Shout>,
    pub rated: Vec<Shout>,
    pub rated_month: Vec<Shout>,
}

/// Builds every top list from `shouts`. `now` is unix seconds; "month" means
/// shouts created in the calendar month of `now` or the one before it.
pub fn compute_tops(shouts: &[Shout], now: i64) -> Tops {
    let topics: Vec<Topic> = shouts
        .iter()
        .flat_map(|shout| shout.topics.iter())
        .unique_by(|topic| &topic.slug)
        .cloned()
        .collect();
    let authors: Vec<Author> = shouts
        .iter()
        .flat_map(|shout| shout.authors.iter())
        .unique_by(|author| &author.slug)
        .cloned()
        .collect();
    let this_month: Vec<Shout> = shouts
        .iter()
        .filter(|shout| in_recent_month(shout.created_at, now))
        .cloned()
        .collect();

    let tops = Tops {
        topics: top_by_stat(&topics, Metric::Shouts, TOP_SIZE),
        authors: top_by_stat(&authors, Metric::Shouts, TOP_SIZE),
        viewed: top_by_stat(shouts, Metric::Viewed, TOP_SIZE),
        commented: top_by_stat(shouts, Metric::Commented, TOP_SIZE),
        reacted: top_by_stat(shouts, Metric::Reacted, TOP_SIZE),
        rated: top_by_stat(shouts, Metric::Rating, TOP_SIZE),
        rated_month: top_by_stat(&this_month, Metric::Rating, TOP_SIZE),
    };
    debug!("Top lists updated from {} shouts", shouts.len());
    tops
}

fn in_recent_month(created_at: i64, now: i64) -> bool {
    let (created, now) = match (
        Utc.timestamp_opt(created_at, 0).single(),
        Utc.timestamp_opt(now, 0).single(),
    ) {
        (Some(created), Some(now)) => (created, now),
        _ => return false,
    };
    let (previous_year, previous_month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    (created.year() == now.year() && created.month() == now.month())
        || (created.year() == previous_year && created.month() == previous_month)
}
