use log::trace;
use rand::{seq::SliceRandom, Rng};
use std::collections::{BTreeMap, HashMap};
use zine_msg::{Metric, Topic};
use zine_ref::{AuthorSlug, TopicSlug};

use crate::{
    entity::EntityMap,
    group::group_by_title,
    sort::{sort_topics, top_by_stat, TopicsSortBy},
};

#[derive(Debug, Default)]
pub struct TopicsStore {
    entities: EntityMap<Topic>,
    sort_by: TopicsSortBy,
    sorted: Vec<TopicSlug>,
    random: Vec<TopicSlug>,
    by_author: HashMap<AuthorSlug, Vec<TopicSlug>>,
}

impl TopicsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, topics: Vec<Topic>) -> usize {
        if topics.is_empty() {
            return 0;
        }
        let merged = self.entities.merge(topics);
        trace!("Merged {} topics, {} known", merged, self.entities.len());
        self.recompute_sorted();
        merged
    }

    pub fn add_missing(&mut self, topics: Vec<Topic>) -> usize {
        let added = topics
            .into_iter()
            .filter(|topic| self.entities.insert_missing(topic.clone()))
            .count();
        if added > 0 {
            self.recompute_sorted();
        }
        added
    }

    pub fn add_by_author(&mut self, index: Vec<(AuthorSlug, Vec<Topic>)>) {
        for (author, topics) in index {
            let slugs = self.by_author.entry(author).or_default();
            for topic in &topics {
                if !slugs.contains(&topic.slug) {
                    slugs.push(topic.slug.clone());
                }
            }
            self.add_missing(topics);
        }
    }

    pub fn set_sort_by(&mut self, sort_by: TopicsSortBy) {
        self.sort_by = sort_by;
        self.recompute_sorted();
    }

    pub fn sort_by(&self) -> TopicsSortBy {
        self.sort_by
    }

    fn recompute_sorted(&mut self) {
        let mut topics = self.entities.to_vec();
        sort_topics(&mut topics, self.sort_by);
        self.sorted = topics.into_iter().map(|topic| topic.slug).collect();
    }

    pub fn set_random(&mut self, topics: Vec<Topic>) {
        self.random = topics.iter().map(|topic| topic.slug.clone()).collect();
        self.add_missing(topics);
    }

    /// Picks up to `amount` distinct known topics.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R, amount: usize) -> Vec<Topic> {
        self.entities
            .to_vec()
            .choose_multiple(rng, amount)
            .cloned()
            .collect()
    }

    pub fn get(&self, slug: &TopicSlug) -> Option<&Topic> {
        self.entities.get(slug)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn all(&self) -> Vec<Topic> {
        self.entities.to_vec()
    }

    pub fn sorted(&self) -> Vec<Topic> {
        self.entities.resolve(&self.sorted)
    }

    pub fn random(&self) -> Vec<Topic> {
        self.entities.resolve(&self.random)
    }

    pub fn top(&self, limit: usize) -> Vec<Topic> {
        top_by_stat(&self.entities.to_vec(), Metric::Shouts, limit)
    }

    pub fn by_author(&self, slug: &AuthorSlug) -> Vec<Topic> {
        self.by_author
            .get(slug)
            .map(|slugs| self.entities.resolve(slugs))
            .unwrap_or_default()
    }

    pub fn grouped(&self) -> BTreeMap<String, Vec<Topic>> {
        group_by_title(&self.sorted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    fn topic(slug: &str, title: &str, shouts: i64, followers: i64) -> Topic {
        serde_json::from_value(json!({
            "id": shouts,
            "slug": slug,
            "title": title,
            "stat": { "shouts": shouts, "followers": followers },
        }))
        .unwrap()
    }

    fn slugs(topics: &[Topic]) -> Vec<&str> {
        topics.iter().map(|topic| topic.slug.as_str()).collect()
    }

    #[test]
    fn sorted_and_top() {
        let mut store = TopicsStore::new();
        store.add(vec![
            topic("art", "Art", 2, 9),
            topic("music", "music", 7, 1),
            topic("culture", "Culture", 4, 3),
        ]);
        assert_eq!(slugs(&store.sorted()), vec!["music", "culture", "art"]);
        assert_eq!(slugs(&store.top(2)), vec!["music", "culture"]);

        store.set_sort_by(TopicsSortBy::Followers);
        assert_eq!(slugs(&store.sorted()), vec!["art", "culture", "music"]);

        store.set_sort_by(TopicsSortBy::from_name("title"));
        assert_eq!(slugs(&store.sorted()), vec!["art", "culture", "music"]);
    }

    #[test]
    fn random_picks_are_distinct_and_known() {
        let mut store = TopicsStore::new();
        store.add(vec![
            topic("art", "Art", 1, 0),
            topic("music", "Music", 1, 0),
            topic("culture", "Culture", 1, 0),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = store.pick_random(&mut rng, 2);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0].slug, picked[1].slug);
        assert_eq!(store.pick_random(&mut rng, 10).len(), 3);

        store.set_random(vec![topic("film", "Film", 0, 0)]);
        assert_eq!(slugs(&store.random()), vec!["film"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn topics_by_author_dedupes() {
        let mut store = TopicsStore::new();
        let anna = AuthorSlug::try_from("anna").unwrap();
        store.add_by_author(vec![(
            anna.clone(),
            vec![topic("art", "Art", 1, 0), topic("art", "Art", 1, 0)],
        )]);
        assert_eq!(slugs(&store.by_author(&anna)), vec!["art"]);
    }
}
