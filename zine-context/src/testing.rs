use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use zine_msg::{
    Author, AuthorsBy, Chat, CreateChat, CreateMessage, FollowingEntity, LoadShoutsOptions,
    Message, MessagesBy, NotificationsResult, Reaction, ReactionInput, ReactionsBy, SearchOptions,
    Shout, SseMessage, Subscriptions, Topic,
};
use zine_ref::{AuthorSlug, ReactionId, ShoutSlug, TopicSlug};
use zine_store::{ApiError, CoreApi};

use crate::api::{EventSource, InboxApi, NotifierApi};

/// Backend double: serves fixed topics and subscriptions, records follows,
/// and has nothing to say on the other ports.
#[derive(Default)]
pub(crate) struct MockCore {
    pub(crate) topics: Mutex<Vec<Topic>>,
    pub(crate) topic_calls: AtomicUsize,
    /// None makes the subscriptions call fail.
    pub(crate) subscriptions: Mutex<Option<Subscriptions>>,
    pub(crate) follows: Mutex<Vec<String>>,
    pub(crate) notification_calls: AtomicUsize,
    /// How many of the next notification loads fail.
    pub(crate) notification_failures: AtomicUsize,
}

#[async_trait]
impl CoreApi for MockCore {
    async fn get_shouts(&self, _options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_my_feed(&self, _options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_shouts_search(&self, _options: &SearchOptions) -> Result<Vec<Shout>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_shout(&self, _slug: &ShoutSlug) -> Result<Option<Shout>, ApiError> {
        Ok(None)
    }

    async fn get_author(&self, _slug: &AuthorSlug) -> Result<Option<Author>, ApiError> {
        Ok(None)
    }

    async fn get_all_authors(&self) -> Result<Vec<Author>, ApiError> {
        Ok(Vec::new())
    }

    async fn load_authors_by(
        &self,
        _by: &AuthorsBy,
        _limit: u32,
        _offset: u32,
    ) -> Result<Vec<Author>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_all_topics(&self) -> Result<Vec<Topic>, ApiError> {
        self.topic_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.topics.lock().clone())
    }

    async fn get_random_topics(&self, _amount: u32) -> Result<Vec<Topic>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_topic(&self, _slug: &TopicSlug) -> Result<Option<Topic>, ApiError> {
        Ok(None)
    }

    async fn load_reactions_by(
        &self,
        _by: &ReactionsBy,
        _limit: u32,
        _offset: u32,
    ) -> Result<Vec<Reaction>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_reaction(&self, _input: &ReactionInput) -> Result<Reaction, ApiError> {
        Err(ApiError::new("offline"))
    }

    async fn update_reaction(&self, _input: &ReactionInput) -> Result<Reaction, ApiError> {
        Err(ApiError::new("offline"))
    }

    async fn delete_reaction(&self, _id: ReactionId) -> Result<(), ApiError> {
        Ok(())
    }

    async fn follow(&self, what: FollowingEntity, slug: &str) -> Result<(), ApiError> {
        self.follows.lock().push(format!("follow {} {}", what, slug));
        Ok(())
    }

    async fn unfollow(&self, what: FollowingEntity, slug: &str) -> Result<(), ApiError> {
        self.follows.lock().push(format!("unfollow {} {}", what, slug));
        Ok(())
    }

    async fn get_my_subscriptions(&self) -> Result<Subscriptions, ApiError> {
        self.subscriptions
            .lock()
            .clone()
            .ok_or_else(|| ApiError::new("unauthorized"))
    }
}

#[async_trait]
impl NotifierApi for MockCore {
    async fn load_notifications(
        &self,
        _limit: u32,
        _offset: u32,
    ) -> Result<NotificationsResult, ApiError> {
        self.notification_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .notification_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ApiError::new("notifier unavailable"));
        }
        Ok(NotificationsResult::default())
    }

    async fn mark_notification_as_read(&self, _id: i64) -> Result<(), ApiError> {
        Ok(())
    }

    async fn mark_all_notifications_as_read(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn mark_thread_seen(&self, _thread: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

#[async_trait]
impl InboxApi for MockCore {
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
        Err(ApiError::new("offline"))
    }

    async fn create_chat(&self, _input: &CreateChat) -> Result<Chat, ApiError> {
        Err(ApiError::new("offline"))
    }
}

#[async_trait]
impl EventSource for MockCore {
    async fn connect(&self, _token: &str) -> Result<mpsc::Receiver<SseMessage>, ApiError> {
        Err(ApiError::new("refused"))
    }
}
