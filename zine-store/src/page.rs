use serde::Serialize;

/// One page of a paged load.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// How many items to ask the backend for: one extra to detect a next page.
pub fn request_limit(limit: u32) -> u32 {
    limit.saturating_add(1)
}

/// Splits an over-fetched response into at most `limit` items and a next-page flag.
///
/// `has_more` is set only when exactly `limit + 1` items came back.
pub fn split_page<T>(mut fetched: Vec<T>, limit: u32) -> Page<T> {
    let has_more = fetched.len() as u64 == limit as u64 + 1;
    fetched.truncate(limit as usize);
    Page {
        items: fetched,
        has_more,
    }
}
