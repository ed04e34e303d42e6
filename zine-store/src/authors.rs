use log::trace;
use std::collections::{BTreeMap, HashMap};
use zine_msg::Author;
use zine_ref::{AuthorSlug, TopicSlug};

use crate::{
    entity::EntityMap,
    group::group_by_name,
    sort::{sort_authors, AuthorsSortBy},
};

#[derive(Debug, Default)]
pub struct AuthorsStore {
    entities: EntityMap<Author>,
    sort_by: AuthorsSortBy,
    sorted: Vec<AuthorSlug>,
    by_topic: HashMap<TopicSlug, Vec<AuthorSlug>>,
    top: Vec<AuthorSlug>,
}

impl AuthorsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, authors: Vec<Author>) -> usize {
        if authors.is_empty() {
            return 0;
        }
        let merged = self.entities.merge(authors);
        trace!("Merged {} authors, {} known", merged, self.entities.len());
        self.recompute_sorted();
        merged
    }

    /// Adds authors embedded in other entities without overwriting richer
    /// records fetched directly.
    pub fn add_missing(&mut self, authors: Vec<Author>) -> usize {
        let added = authors
            .into_iter()
            .filter(|author| self.entities.insert_missing(author.clone()))
            .count();
        if added > 0 {
            self.recompute_sorted();
        }
        added
    }

    pub fn add_by_topic(&mut self, index: Vec<(TopicSlug, Vec<Author>)>) {
        for (topic, authors) in index {
            let slugs = self.by_topic.entry(topic).or_default();
            for author in &authors {
                if !slugs.contains(&author.slug) {
                    slugs.push(author.slug.clone());
                }
            }
            self.add_missing(authors);
        }
    }

    pub fn set_sort_by(&mut self, sort_by: AuthorsSortBy) {
        self.sort_by = sort_by;
        self.recompute_sorted();
    }

    pub fn sort_by(&self) -> AuthorsSortBy {
        self.sort_by
    }

    fn recompute_sorted(&mut self) {
        let mut authors = self.entities.to_vec();
        sort_authors(&mut authors, self.sort_by);
        self.sorted = authors.into_iter().map(|author| author.slug).collect();
    }

    /// Ranks authors that have shouts by summed shout rating.
    pub fn set_top(&mut self, ratings: &HashMap<AuthorSlug, i64>, limit: usize) {
        let mut rated: Vec<(&AuthorSlug, i64)> = self
            .entities
            .values()
            .filter_map(|author| {
                ratings
                    .get(&author.slug)
                    .map(|rating| (&author.slug, *rating))
            })
            .collect();
        rated.sort_by(|a, b| b.1.cmp(&a.1));
        self.top = rated
            .into_iter()
            .take(limit)
            .map(|(slug, _)| slug.clone())
            .collect();
    }

    pub fn get(&self, slug: &AuthorSlug) -> Option<&Author> {
        self.entities.get(slug)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn all(&self) -> Vec<Author> {
        self.entities.to_vec()
    }

    pub fn sorted(&self) -> Vec<Author> {
        self.entities.resolve(&self.sorted)
    }

    pub fn by_topic(&self, slug: &TopicSlug) -> Vec<Author> {
        self.by_topic
            .get(slug)
            .map(|slugs| self.entities.resolve(slugs))
            .unwrap_or_default()
    }

    pub fn top(&self) -> Vec<Author> {
        self.entities.resolve(&self.top)
    }

    pub fn grouped(&self) -> BTreeMap<String, Vec<Author>> {
        group_by_name(&self.sorted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zine_msg::Metric;

    fn author(slug: &str, name: &str, created_at: i64, followers: i64) -> Author {
        serde_json::from_value(json!({
            "id": created_at,
            "slug": slug,
            "name": name,
            "created_at": created_at,
            "stat": { "followers": followers },
        }))
        .unwrap()
    }

    fn slugs(authors: &[Author]) -> Vec<&str> {
        authors.iter().map(|author| author.slug.as_str()).collect()
    }

    #[test]
    fn sort_modes() {
        let mut store = AuthorsStore::new();
        store.add(vec![
            author("zoe", "Zoe", 3, 10),
            author("anna", "anna", 1, 2),
            author("bob", "Bob", 2, 10),
        ]);
        assert_eq!(slugs(&store.sorted()), vec!["anna", "bob", "zoe"]);

        store.set_sort_by(AuthorsSortBy::Name);
        assert_eq!(slugs(&store.sorted()), vec!["anna", "bob", "zoe"]);

        store.set_sort_by(AuthorsSortBy::Stat(Metric::Followers));
        assert_eq!(slugs(&store.sorted()), vec!["zoe", "bob", "anna"]);
    }

    #[test]
    fn embedded_authors_do_not_clobber() {
        let mut store = AuthorsStore::new();
        store.add(vec![author("anna", "Anna Full", 1, 7)]);
        let bare: Author = serde_json::from_value(json!({ "id": 1, "slug": "anna" })).unwrap();
        let zoe: Author = serde_json::from_value(json!({ "id": 2, "slug": "zoe" })).unwrap();

        assert_eq!(store.add_missing(vec![bare, zoe]), 1);
        let anna = store.get(&AuthorSlug::try_from("anna").unwrap()).unwrap();
        assert_eq!(anna.display_name(), "Anna Full");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn authors_by_topic_dedupes() {
        let mut store = AuthorsStore::new();
        let art = TopicSlug::try_from("art").unwrap();
        store.add_by_topic(vec![(art.clone(), vec![author("anna", "Anna", 1, 0)])]);
        store.add_by_topic(vec![(
            art.clone(),
            vec![author("anna", "Anna", 1, 0), author("zoe", "Zoe", 2, 0)],
        )]);
        assert_eq!(slugs(&store.by_topic(&art)), vec!["anna", "zoe"]);
    }

    #[test]
    fn top_authors_by_rating() {
        let mut store = AuthorsStore::new();
        store.add(vec![
            author("anna", "Anna", 1, 0),
            author("bob", "Bob", 2, 0),
            author("zoe", "Zoe", 3, 0),
        ]);
        let ratings: HashMap<AuthorSlug, i64> = vec![
            (AuthorSlug::try_from("bob").unwrap(), 4),
            (AuthorSlug::try_from("zoe").unwrap(), 9),
        ]
        .into_iter()
        .collect();
        store.set_top(&ratings, 5);
        assert_eq!(slugs(&store.top()), vec!["zoe", "bob"]);
    }
}
