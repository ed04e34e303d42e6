use std::collections::BTreeMap;
use zine_msg::{Author, Topic};

use crate::sort::by_name;

pub const LATIN_GROUP: &str = "A-Z";
pub const OTHER_GROUP: &str = "#";

/// Alphabet bucket for a name: every Latin letter shares "A-Z", a Cyrillic
/// letter is its own uppercase bucket, anything else goes to "#".
pub fn first_letter_group(name: &str) -> String {
    let first = match name.trim().chars().next() {
        Some(first) => first,
        None => return OTHER_GROUP.to_string(),
    };

    if is_latin(first) {
        LATIN_GROUP.to_string()
    } else if is_cyrillic(first) {
        first.to_uppercase().collect()
    } else {
        OTHER_GROUP.to_string()
    }
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
}

fn is_cyrillic(c: char) -> bool {
    c.is_alphabetic() && ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// Groups items under their first-letter bucket, each group sorted by name.
pub fn group_by_first_letter<T, F>(items: &[T], name: F) -> BTreeMap<String, Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        groups
            .entry(first_letter_group(name(item)))
            .or_default()
            .push(item.clone());
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| by_name(name(a), name(b)));
    }
    groups
}

pub fn group_by_name(authors: &[Author]) -> BTreeMap<String, Vec<Author>> {
    group_by_first_letter(authors, |author| author.display_name())
}

pub fn group_by_title(topics: &[Topic]) -> BTreeMap<String, Vec<Topic>> {
    group_by_first_letter(topics, |topic| topic.display_title())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn author(slug: &str, name: &str) -> Author {
        serde_json::from_value(json!({ "id": 1, "slug": slug, "name": name })).unwrap()
    }

    #[test]
    fn latin_and_cyrillic_split() {
        let groups = group_by_name(&[author("anna", "Анна"), author("zoe", "Zoe")]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["A-Z"][0].display_name(), "Zoe");
        assert_eq!(groups["А"][0].display_name(), "Анна");
    }

    #[test]
    fn other_names_and_ordering() {
        assert_eq!(first_letter_group("  émile"), "A-Z");
        assert_eq!(first_letter_group("ёжик"), "Ё");
        assert_eq!(first_letter_group("42 things"), "#");
        assert_eq!(first_letter_group(""), "#");

        let groups = group_by_name(&[author("b", "bob"), author("a", "Alice")]);
        let names: Vec<&str> = groups["A-Z"].iter().map(|a| a.display_name()).collect();
        assert_eq!(names, vec!["Alice", "bob"]);
    }
}
