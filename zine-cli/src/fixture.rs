use async_trait::async_trait;
use serde::Deserialize;
use std::{fs, io, path::Path};
use tokio::sync::mpsc;
use zine_context::{AuthApi, EventSource, InboxApi, NotifierApi};
use zine_msg::{
    AuthResult, Author, AuthorsBy, Chat, CreateChat, CreateMessage, Credentials, FollowingEntity,
    LoadShoutsOptions, Message, MessagesBy, NotificationsResult, OAuthProvider, Reaction,
    ReactionInput, ReactionsBy, SearchOptions, Shout, SignUpInput, SseMessage, Subscriptions,
    Topic,
};
use zine_ref::{AuthorSlug, ReactionId, ShoutSlug, TopicSlug};
use zine_store::{ApiError, CoreApi};

/// A backend snapshot read from a json file. Answers every port offline:
/// reads come from the snapshot, writes fail.
#[derive(Debug, Default, Deserialize)]
pub struct FixtureApi {
    #[serde(default)]
    shouts: Vec<Shout>,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    reactions: Vec<Reaction>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read fixture, cause: {0}")]
    Read(#[from] io::Error),
    #[error("Failed to parse fixture, cause: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FixtureApi {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn offline<T>() -> Result<T, ApiError> {
        Err(ApiError::new("offline fixture is read only"))
    }
}

fn page<T: Clone>(items: impl Iterator<Item = T>, limit: u32, offset: u32) -> Vec<T> {
    items.skip(offset as usize).take(limit as usize).collect()
}

fn matches_filters(shout: &Shout, options: &LoadShoutsOptions) -> bool {
    let filters = &options.filters;
    if let Some(layouts) = &filters.layouts {
        if !layouts.contains(&shout.layout) {
            return false;
        }
    }
    if let Some(author) = &filters.author {
        if !shout.authors.iter().any(|a| &a.slug == author) {
            return false;
        }
    }
    if let Some(topic) = &filters.topic {
        if !shout.topics.iter().any(|t| &t.slug == topic) {
            return false;
        }
    }
    true
}

#[async_trait]
impl CoreApi for FixtureApi {
    async fn get_shouts(&self, options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError> {
        let shouts = self
            .shouts
            .iter()
            .filter(|shout| matches_filters(shout, options))
            .cloned();
        Ok(page(shouts, options.limit, options.offset))
    }

    async fn get_my_feed(&self, options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError> {
        self.get_shouts(options).await
    }

    async fn get_shouts_search(&self, options: &SearchOptions) -> Result<Vec<Shout>, ApiError> {
        let text = options.text.to_lowercase();
        let shouts = self
            .shouts
            .iter()
            .filter(|shout| shout.title.to_lowercase().contains(&text))
            .cloned();
        Ok(page(shouts, options.limit, options.offset))
    }

    async fn get_shout(&self, slug: &ShoutSlug) -> Result<Option<Shout>, ApiError> {
        Ok(self.shouts.iter().find(|shout| &shout.slug == slug).cloned())
    }

    async fn get_author(&self, slug: &AuthorSlug) -> Result<Option<Author>, ApiError> {
        Ok(self.authors.iter().find(|author| &author.slug == slug).cloned())
    }

    async fn get_all_authors(&self) -> Result<Vec<Author>, ApiError> {
        Ok(self.authors.clone())
    }

    async fn load_authors_by(
        &self,
        _by: &AuthorsBy,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Author>, ApiError> {
        Ok(page(self.authors.iter().cloned(), limit, offset))
    }

    async fn get_all_topics(&self) -> Result<Vec<Topic>, ApiError> {
        Ok(self.topics.clone())
    }

    async fn get_random_topics(&self, amount: u32) -> Result<Vec<Topic>, ApiError> {
        Ok(page(self.topics.iter().cloned(), amount, 0))
    }

    async fn get_topic(&self, slug: &TopicSlug) -> Result<Option<Topic>, ApiError> {
        Ok(self.topics.iter().find(|topic| &topic.slug == slug).cloned())
    }

    async fn load_reactions_by(
        &self,
        by: &ReactionsBy,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Reaction>, ApiError> {
        let reactions = self
            .reactions
            .iter()
            .filter(|reaction| {
                by.shout
                    .as_ref()
                    .map_or(true, |slug| &reaction.shout.slug == slug)
            })
            .cloned();
        Ok(page(reactions, limit, offset))
    }

    async fn create_reaction(&self, _input: &ReactionInput) -> Result<Reaction, ApiError> {
        Self::offline()
    }

    async fn update_reaction(&self, _input: &ReactionInput) -> Result<Reaction, ApiError> {
        Self::offline()
    }

    async fn delete_reaction(&self, _id: ReactionId) -> Result<(), ApiError> {
        Self::offline()
    }

    async fn follow(&self, _what: FollowingEntity, _slug: &str) -> Result<(), ApiError> {
        Self::offline()
    }

    async fn unfollow(&self, _what: FollowingEntity, _slug: &str) -> Result<(), ApiError> {
        Self::offline()
    }

    async fn get_my_subscriptions(&self) -> Result<Subscriptions, ApiError> {
        Ok(Subscriptions::default())
    }
}

#[async_trait]
impl AuthApi for FixtureApi {
    async fn get_session(&self, _token: Option<&str>) -> Result<Option<AuthResult>, ApiError> {
        Ok(None)
    }

    async fn login(&self, _credentials: &Credentials) -> Result<AuthResult, ApiError> {
        Self::offline()
    }

    async fn signup(&self, _input: &SignUpInput) -> Result<AuthResult, ApiError> {
        Self::offline()
    }

    async fn logout(&self, _token: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn verify_email(&self, _token: &str) -> Result<AuthResult, ApiError> {
        Self::offline()
    }

    async fn oauth_login(&self, _provider: OAuthProvider) -> Result<AuthResult, ApiError> {
        Self::offline()
    }
}

#[async_trait]
impl NotifierApi for FixtureApi {
    async fn load_notifications(
        &self,
        _limit: u32,
        _offset: u32,
    ) -> Result<NotificationsResult, ApiError> {
        Ok(NotificationsResult::default())
    }

    async fn mark_notification_as_read(&self, _id: i64) -> Result<(), ApiError> {
        Self::offline()
    }

    async fn mark_all_notifications_as_read(&self) -> Result<(), ApiError> {
        Self::offline()
    }

    async fn mark_thread_seen(&self, _thread: &str) -> Result<(), ApiError> {
        Self::offline()
    }
}

#[async_trait]
impl InboxApi for FixtureApi {
    async fn load_chats(&self, _limit: u32, _offset: u32) -> Result<Vec<Chat>, ApiError> {
        Ok(Vec::new())
    }

    async fn load_chat_messages(
        &self,
        _by: &MessagesBy,
        _limit: u32,
        _offset: u32,
    ) -> Result<Vec<Message>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_message(&self, _input: &CreateMessage) -> Result<Message, ApiError> {
        Self::offline()
    }

    async fn create_chat(&self, _input: &CreateChat) -> Result<Chat, ApiError> {
        Self::offline()
    }
}

#[async_trait]
impl EventSource for FixtureApi {
    async fn connect(&self, _token: &str) -> Result<mpsc::Receiver<SseMessage>, ApiError> {
        Self::offline()
    }
}
