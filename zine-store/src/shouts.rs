use itertools::Itertools;
use log::trace;
use std::collections::HashMap;
use zine_msg::{Author, HasStat, Layout, Metric, Shout, Topic};
use zine_ref::{AuthorSlug, ShoutSlug, TopicSlug};

use crate::{entity::EntityMap, sort::by_stat_desc};

/// Shouts keyed by slug, with the views derived from them.
#[derive(Debug, Default)]
pub struct ShoutsStore {
    entities: EntityMap<Shout>,
    sorted: Vec<ShoutSlug>,
    by_author: HashMap<AuthorSlug, Vec<ShoutSlug>>,
    by_topic: HashMap<TopicSlug, Vec<ShoutSlug>>,
    by_layout: HashMap<Layout, Vec<ShoutSlug>>,
    top_viewed: Vec<ShoutSlug>,
    top_commented: Vec<ShoutSlug>,
    top: Vec<ShoutSlug>,
    top_month: Vec<ShoutSlug>,
}

impl ShoutsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shouts: Vec<Shout>) -> usize {
        if shouts.is_empty() {
            return 0;
        }
        let merged = self.entities.merge(shouts);
        trace!("Merged {} shouts, {} known", merged, self.entities.len());
        self.recompute();
        merged
    }

    fn recompute(&mut self) {
        self.by_author.clear();
        self.by_topic.clear();
        self.by_layout.clear();

        for shout in self.entities.values() {
            for author in shout.authors.iter().unique_by(|author| &author.slug) {
                self.by_author
                    .entry(author.slug.clone())
                    .or_default()
                    .push(shout.slug.clone());
            }
            for topic in shout.topics.iter().unique_by(|topic| &topic.slug) {
                self.by_topic
                    .entry(topic.slug.clone())
                    .or_default()
                    .push(shout.slug.clone());
            }
            self.by_layout
                .entry(shout.layout.clone())
                .or_default()
                .push(shout.slug.clone());
        }

        self.top_viewed = self.slugs_by_stat(Metric::Viewed);
        self.top_commented = self.slugs_by_stat(Metric::Commented);
    }

    fn slugs_by_stat(&self, metric: Metric) -> Vec<ShoutSlug> {
        self.entities
            .values()
            .sorted_by(|a, b| by_stat_desc(*a, *b, metric))
            .map(|shout| shout.slug.clone())
            .collect()
    }

    pub fn get(&self, slug: &ShoutSlug) -> Option<&Shout> {
        self.entities.get(slug)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn all(&self) -> Vec<Shout> {
        self.entities.to_vec()
    }

    // feed list

    pub fn append_sorted(&mut self, shouts: &[Shout]) {
        self.sorted
            .extend(shouts.iter().map(|shout| shout.slug.clone()));
    }

    pub fn set_sorted(&mut self, shouts: &[Shout]) {
        self.sorted.clear();
        self.append_sorted(shouts);
    }

    pub fn reset_sorted(&mut self) {
        self.sorted.clear();
    }

    pub fn sorted_contains(&self, slug: &ShoutSlug) -> bool {
        self.sorted.contains(slug)
    }

    pub fn sorted(&self) -> Vec<Shout> {
        self.entities.resolve(&self.sorted)
    }

    // derived views

    pub fn by_author(&self, slug: &AuthorSlug) -> Vec<Shout> {
        self.resolve_index(self.by_author.get(slug))
    }

    pub fn by_topic(&self, slug: &TopicSlug) -> Vec<Shout> {
        self.resolve_index(self.by_topic.get(slug))
    }

    pub fn by_layout(&self, layout: &Layout) -> Vec<Shout> {
        self.resolve_index(self.by_layout.get(layout))
    }

    fn resolve_index(&self, slugs: Option<&Vec<ShoutSlug>>) -> Vec<Shout> {
        slugs
            .map(|slugs| self.entities.resolve(slugs))
            .unwrap_or_default()
    }

    pub fn top_viewed(&self) -> Vec<Shout> {
        self.entities.resolve(&self.top_viewed)
    }

    pub fn top_commented(&self) -> Vec<Shout> {
        self.entities.resolve(&self.top_commented)
    }

    pub fn top_by_metric(&self, metric: Metric, limit: usize) -> Vec<Shout> {
        self.entities
            .values()
            .sorted_by(|a, b| by_stat_desc(*a, *b, metric))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Summed shout ratings per author slug.
    pub fn ratings_by_author(&self) -> HashMap<AuthorSlug, i64> {
        self.by_author
            .iter()
            .map(|(author, slugs)| {
                let rating = slugs
                    .iter()
                    .filter_map(|slug| self.entities.get(slug))
                    .map(|shout| shout.stat_value(Metric::Rating))
                    .sum();
                (author.clone(), rating)
            })
            .collect()
    }

    // loader-owned lists

    pub fn set_top(&mut self, shouts: &[Shout]) {
        self.top = shouts.iter().map(|shout| shout.slug.clone()).collect();
    }

    pub fn top(&self) -> Vec<Shout> {
        self.entities.resolve(&self.top)
    }

    pub fn set_top_month(&mut self, shouts: &[Shout]) {
        self.top_month = shouts.iter().map(|shout| shout.slug.clone()).collect();
    }

    pub fn top_month(&self) -> Vec<Shout> {
        self.entities.resolve(&self.top_month)
    }
}

/// Authors seen per topic across a batch of shouts, deduplicated by slug.
pub fn authors_by_topic(shouts: &[Shout]) -> Vec<(TopicSlug, Vec<Author>)> {
    let mut index: Vec<(TopicSlug, Vec<Author>)> = Vec::new();
    for shout in shouts {
        for topic in &shout.topics {
            let position = match index.iter().position(|(slug, _)| slug == &topic.slug) {
                Some(position) => position,
                None => {
                    index.push((topic.slug.clone(), Vec::new()));
                    index.len() - 1
                }
            };
            let authors = &mut index[position].1;
            for author in &shout.authors {
                if !authors.iter().any(|known| known.slug == author.slug) {
                    authors.push(author.clone());
                }
            }
        }
    }
    index
}

/// Topics seen per author across a batch of shouts, deduplicated by slug.
pub fn topics_by_author(shouts: &[Shout]) -> Vec<(AuthorSlug, Vec<Topic>)> {
    let mut index: Vec<(AuthorSlug, Vec<Topic>)> = Vec::new();
    for shout in shouts {
        for author in &shout.authors {
            let position = match index.iter().position(|(slug, _)| slug == &author.slug) {
                Some(position) => position,
                None => {
                    index.push((author.slug.clone(), Vec::new()));
                    index.len() - 1
                }
            };
            let topics = &mut index[position].1;
            for topic in &shout.topics {
                if !topics.iter().any(|known| known.slug == topic.slug) {
                    topics.push(topic.clone());
                }
            }
        }
    }
    index
}
