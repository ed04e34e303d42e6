use std::{collections::HashMap, fmt::Debug, hash::Hash};
use zine_msg::{Author, Chat, Message, Notification, Reaction, Shout, Topic};
use zine_ref::{AuthorSlug, ChatId, ReactionId, ShoutSlug, TopicSlug};

/// A backend entity with a natural unique key.
pub trait Entity: Clone {
    type Key: Clone + Debug + Eq + Hash;

    fn key(&self) -> Self::Key;
}

impl Entity for Shout {
    type Key = ShoutSlug;

    fn key(&self) -> ShoutSlug {
        self.slug.clone()
    }
}

impl Entity for Author {
    type Key = AuthorSlug;

    fn key(&self) -> AuthorSlug {
        self.slug.clone()
    }
}

impl Entity for Topic {
    type Key = TopicSlug;

    fn key(&self) -> TopicSlug {
        self.slug.clone()
    }
}

impl Entity for Reaction {
    type Key = ReactionId;

    fn key(&self) -> ReactionId {
        self.id
    }
}

impl Entity for Notification {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

impl Entity for Chat {
    type Key = ChatId;

    fn key(&self) -> ChatId {
        self.id.clone()
    }
}

impl Entity for Message {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

/// Keyed entity map that remembers the order keys first appeared in.
///
/// Overwriting a key keeps its position, so views sorted with a stable sort
/// break ties by first appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityMap<E: Entity> {
    positions: HashMap<E::Key, usize>,
    values: Vec<E>,
}

impl<E: Entity> Default for EntityMap<E> {
    fn default() -> Self {
        EntityMap {
            positions: HashMap::new(),
            values: Vec::new(),
        }
    }
}

impl<E: Entity> EntityMap<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: E) -> Option<E> {
        let key = entity.key();
        match self.positions.get(&key) {
            Some(&position) => Some(std::mem::replace(&mut self.values[position], entity)),
            None => {
                self.positions.insert(key, self.values.len());
                self.values.push(entity);
                None
            }
        }
    }

    /// Inserts only when the key is not yet known.
    pub fn insert_missing(&mut self, entity: E) -> bool {
        if self.positions.contains_key(&entity.key()) {
            return false;
        }
        self.insert(entity);
        true
    }

    /// Merges a batch, later values winning over earlier ones. Returns how many were merged.
    pub fn merge<I: IntoIterator<Item = E>>(&mut self, entities: I) -> usize {
        let mut merged = 0;
        for entity in entities {
            self.insert(entity);
            merged += 1;
        }
        merged
    }

    pub fn remove(&mut self, key: &E::Key) -> Option<E> {
        let position = self.positions.remove(key)?;
        let removed = self.values.remove(position);
        for value in &self.values[position..] {
            if let Some(index) = self.positions.get_mut(&value.key()) {
                *index -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, key: &E::Key) -> Option<&E> {
        self.positions
            .get(key)
            .and_then(|&position| self.values.get(position))
    }

    pub fn contains_key(&self, key: &E::Key) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in first-appearance order.
    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.values.iter()
    }

    pub fn to_vec(&self) -> Vec<E> {
        self.values.clone()
    }

    /// Resolves keys to values, skipping unknown keys.
    pub fn resolve<'a, I>(&self, keys: I) -> Vec<E>
    where
        I: IntoIterator<Item = &'a E::Key>,
        E::Key: 'a,
    {
        keys.into_iter()
            .filter_map(|key| self.get(key))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        id: u32,
        value: &'static str,
    }

    impl Entity for Item {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn item(id: u32, value: &'static str) -> Item {
        Item { id, value }
    }

    #[test]
    fn later_writes_win_and_keys_union() {
        let mut map = EntityMap::new();
        map.merge(vec![item(1, "a"), item(2, "b")]);
        map.merge(vec![item(2, "B"), item(3, "c")]);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&2).unwrap().value, "B");
        let order: Vec<u32> = map.values().map(|item| item.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_keys_within_a_batch() {
        let mut map = EntityMap::new();
        map.merge(vec![item(1, "first"), item(1, "second")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1).unwrap().value, "second");
    }

    #[test]
    fn empty_merge_is_a_no_op() {
        let mut map = EntityMap::new();
        map.merge(vec![item(1, "a"), item(2, "b")]);
        let before = map.clone();
        assert_eq!(map.merge(Vec::new()), 0);
        assert_eq!(map, before);
    }

    #[test]
    fn remove_keeps_positions_consistent() {
        let mut map = EntityMap::new();
        map.merge(vec![item(1, "a"), item(2, "b"), item(3, "c")]);
        assert_eq!(map.remove(&1), Some(item(1, "a")));
        assert_eq!(map.remove(&1), None);
        assert_eq!(map.get(&3), Some(&item(3, "c")));
        map.insert(item(3, "C"));
        let values: Vec<&str> = map.values().map(|item| item.value).collect();
        assert_eq!(values, vec!["b", "C"]);
        assert!(!map.insert_missing(item(2, "x")));
        assert!(map.insert_missing(item(4, "d")));
        assert_eq!(map.resolve(&[4, 9, 2]), vec![item(4, "d"), item(2, "b")]);
    }
}
