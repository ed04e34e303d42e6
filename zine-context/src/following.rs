use log::{debug, info};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use zine_msg::{FollowingEntity, Subscriptions};
use zine_store::Zine;

use crate::Error;

#[derive(Default)]
struct State {
    subscriptions: Subscriptions,
    followed: HashMap<FollowingEntity, Vec<String>>,
    loaded: bool,
}

/// What the signed in user follows.
pub struct Following {
    zine: Arc<Zine>,
    state: RwLock<State>,
}

impl Following {
    pub fn new(zine: Arc<Zine>) -> Self {
        Following {
            zine,
            state: RwLock::new(State::default()),
        }
    }

    /// Loads my subscriptions and merges the followed authors and topics into
    /// the stores. The context counts as loaded even when the call fails.
    pub async fn load_subscriptions(&self) -> Result<Subscriptions, Error> {
        let result = self.zine.api().get_my_subscriptions().await;
        let mut state = self.state.write();
        state.loaded = true;
        let subscriptions = match result {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                info!("Cannot get subscriptions: {}", err);
                return Err(err.into());
            }
        };
        state.followed = followed_slugs(&subscriptions);
        state.subscriptions = subscriptions.clone();
        drop(state);

        self.zine.add_authors(subscriptions.authors.clone());
        self.zine.add_topics(subscriptions.topics.clone());
        Ok(subscriptions)
    }

    pub async fn follow(&self, what: FollowingEntity, slug: &str) -> Result<(), Error> {
        self.zine.api().follow(what, slug).await?;
        let mut state = self.state.write();
        let slugs = state.followed.entry(what).or_default();
        if !slugs.iter().any(|known| known == slug) {
            slugs.push(slug.to_string());
        }
        debug!("Following {} {}", what, slug);
        Ok(())
    }

    pub async fn unfollow(&self, what: FollowingEntity, slug: &str) -> Result<(), Error> {
        self.zine.api().unfollow(what, slug).await?;
        let mut state = self.state.write();
        if let Some(slugs) = state.followed.get_mut(&what) {
            slugs.retain(|known| known != slug);
        }
        let subscriptions = &mut state.subscriptions;
        match what {
            FollowingEntity::Author => subscriptions
                .authors
                .retain(|author| author.slug.as_str() != slug),
            FollowingEntity::Topic => subscriptions
                .topics
                .retain(|topic| topic.slug.as_str() != slug),
            FollowingEntity::Community => subscriptions
                .communities
                .retain(|community| community.slug != slug),
            FollowingEntity::Shout => {}
        }
        debug!("Unfollowed {} {}", what, slug);
        Ok(())
    }

    pub fn is_following(&self, what: FollowingEntity, slug: &str) -> bool {
        self.state
            .read()
            .followed
            .get(&what)
            .map_or(false, |slugs| slugs.iter().any(|known| known == slug))
    }

    /// Slugs followed of one kind, in the order they were followed.
    pub fn followed(&self, what: FollowingEntity) -> Vec<String> {
        self.state
            .read()
            .followed
            .get(&what)
            .cloned()
            .unwrap_or_default()
    }

    pub fn subscriptions(&self) -> Subscriptions {
        self.state.read().subscriptions.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }
}

fn followed_slugs(subscriptions: &Subscriptions) -> HashMap<FollowingEntity, Vec<String>> {
    let mut followed = HashMap::new();
    followed.insert(
        FollowingEntity::Author,
        subscriptions
            .authors
            .iter()
            .map(|author| author.slug.to_string())
            .collect(),
    );
    followed.insert(
        FollowingEntity::Topic,
        subscriptions
            .topics
            .iter()
            .map(|topic| topic.slug.to_string())
            .collect(),
    );
    followed.insert(
        FollowingEntity::Community,
        subscriptions
            .communities
            .iter()
            .map(|community| community.slug.clone())
            .collect(),
    );
    followed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zine_ref::AuthorSlug;

    use crate::testing::MockCore;

    fn following_with(api: Arc<MockCore>) -> (Following, Arc<Zine>) {
        let zine = Arc::new(Zine::new(api));
        (Following::new(zine.clone()), zine)
    }

    #[tokio::test]
    async fn failed_load_still_counts_as_loaded() {
        let (following, _zine) = following_with(Arc::new(MockCore::default()));
        assert!(!following.is_loaded());
        assert!(following.load_subscriptions().await.is_err());
        assert!(following.is_loaded());
        assert!(!following.is_following(FollowingEntity::Author, "anna"));
    }

    #[tokio::test]
    async fn follow_and_unfollow_update_local_lists() {
        let api = Arc::new(MockCore::default());
        *api.subscriptions.lock() = Some(
            serde_json::from_value(json!({
                "authors": [{ "id": 1, "slug": "anna" }],
                "topics": [{ "id": 2, "slug": "art", "title": "Art" }],
                "communities": null,
            }))
            .unwrap(),
        );
        let (following, zine) = following_with(api.clone());

        following.load_subscriptions().await.unwrap();
        assert!(following.is_following(FollowingEntity::Author, "anna"));
        assert!(following.is_following(FollowingEntity::Topic, "art"));
        let anna = AuthorSlug::try_from("anna").unwrap();
        assert!(zine.author(&anna).is_some());

        following.follow(FollowingEntity::Author, "zoe").await.unwrap();
        following.follow(FollowingEntity::Author, "zoe").await.unwrap();
        assert_eq!(following.followed(FollowingEntity::Author), vec!["anna", "zoe"]);

        following.unfollow(FollowingEntity::Author, "anna").await.unwrap();
        assert_eq!(following.followed(FollowingEntity::Author), vec!["zoe"]);
        assert!(following.subscriptions().authors.is_empty());
        assert_eq!(
            *api.follows.lock(),
            vec!["follow author zoe", "follow author zoe", "unfollow author anna"]
        );
    }
}
