use log::warn;
use parking_lot::Mutex;
use serde::Serialize;
use std::{collections::HashMap, future::Future};
use tokio_util::sync::CancellationToken;

use crate::{api::ApiError, error::Error};

/// Identifies one in-flight request for a loader key. Dropping the latest
/// ticket for a key forgets the key.
#[derive(Debug)]
pub struct Ticket<'a> {
    requests: &'a RequestSequencer,
    key: String,
    token: u64,
}

impl Ticket<'_> {
    pub fn key(&self) -> &str {
        self.key.as_str()
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let mut latest = self.requests.latest.lock();
        if latest.by_key.get(&self.key) == Some(&self.token) {
            latest.by_key.remove(&self.key);
        }
    }
}

#[derive(Debug, Default)]
struct Latest {
    next: u64,
    by_key: HashMap<String, u64>,
}

/// Hands out increasing tokens per loader key, so a response can tell
/// whether a newer request for the same key was started after it. Only keys
/// with a request in flight are kept.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: Mutex<Latest>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, key: String) -> Ticket<'_> {
        let mut latest = self.latest.lock();
        latest.next += 1;
        let token = latest.next;
        latest.by_key.insert(key.clone(), token);
        Ticket {
            requests: self,
            key,
            token,
        }
    }

    pub fn is_latest(&self, ticket: &Ticket) -> bool {
        self.latest.lock().by_key.get(&ticket.key) == Some(&ticket.token)
    }

    pub fn check(&self, ticket: &Ticket) -> Result<(), Error> {
        if self.is_latest(ticket) {
            Ok(())
        } else {
            warn!("Discarding stale response for {}", ticket.key);
            Err(Error::Superseded(ticket.key.clone()))
        }
    }

    /// Number of keys with a request in flight.
    pub fn in_flight(&self) -> usize {
        self.latest.lock().by_key.len()
    }
}

/// Loader key: a loader name plus its filters, leaving out paging.
pub fn request_key<F: Serialize>(kind: &str, filters: &F) -> Result<String, Error> {
    Ok(format!("{}:{}", kind, serde_json::to_string(filters)?))
}

/// Awaits `request` unless `cancel` fires first. A response that lands after
/// cancellation is dropped.
pub async fn until_cancelled<T, F>(cancel: &CancellationToken, request: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        result = request => result,
    };
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn newer_ticket_supersedes_older() {
        let requests = RequestSequencer::new();
        let first = requests.begin("shouts:{}".to_string());
        let other = requests.begin("authors:{}".to_string());
        let second = requests.begin("shouts:{}".to_string());

        assert!(!requests.is_latest(&first));
        assert!(requests.is_latest(&second));
        assert!(requests.is_latest(&other));
        assert!(matches!(
            requests.check(&first),
            Err(Error::Superseded(key)) if key == "shouts:{}"
        ));
    }

    #[test]
    fn finished_keys_are_forgotten() {
        let requests = RequestSequencer::new();
        let first = requests.begin("shout:\"foo\"".to_string());
        let second = requests.begin("shout:\"foo\"".to_string());
        requests.check(&second).unwrap();
        drop(second);
        assert_eq!(requests.in_flight(), 0);

        // a request begun after the key was forgotten never revives the old one
        let third = requests.begin("shout:\"foo\"".to_string());
        assert!(requests.check(&first).is_err());
        drop(first);
        assert!(requests.is_latest(&third));

        for slug in ["a", "b", "c"] {
            let ticket = requests.begin(format!("author:{}", slug));
            requests.check(&ticket).unwrap();
        }
        assert_eq!(requests.in_flight(), 1);
    }

    #[test]
    fn keys_ignore_paging() {
        let key = request_key("shouts", &json!({ "featured": true })).unwrap();
        assert_eq!(key, "shouts:{\"featured\":true}");
    }

    #[tokio::test]
    async fn cancelled_before_response() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<u32, Error> = until_cancelled(&cancel, async { Ok(1) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));

        let live = CancellationToken::new();
        let result = until_cancelled(&live, async { Ok::<_, ApiError>(2) }).await;
        assert_eq!(result.unwrap(), 2);
    }
}
