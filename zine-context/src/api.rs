use async_trait::async_trait;
use tokio::sync::mpsc;
use zine_msg::{
    AuthResult, Chat, CreateChat, CreateMessage, Credentials, Message, MessagesBy,
    NotificationsResult, OAuthProvider, SignUpInput, SseMessage,
};
use zine_store::ApiError;

/// The auth provider.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Current session for `token`, or None when there is none.
    async fn get_session(&self, token: Option<&str>) -> Result<Option<AuthResult>, ApiError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthResult, ApiError>;

    async fn signup(&self, input: &SignUpInput) -> Result<AuthResult, ApiError>;

    async fn logout(&self, token: &str) -> Result<(), ApiError>;

    async fn verify_email(&self, token: &str) -> Result<AuthResult, ApiError>;

    async fn oauth_login(&self, provider: OAuthProvider) -> Result<AuthResult, ApiError>;
}

#[async_trait]
pub trait NotifierApi: Send + Sync {
    async fn load_notifications(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<NotificationsResult, ApiError>;

    async fn mark_notification_as_read(&self, id: i64) -> Result<(), ApiError>;

    async fn mark_all_notifications_as_read(&self) -> Result<(), ApiError>;

    async fn mark_thread_seen(&self, thread: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait InboxApi: Send + Sync {
    async fn load_chats(&self, limit: u32, offset: u32) -> Result<Vec<Chat>, ApiError>;

    async fn load_chat_messages(
        &self,
        by: &MessagesBy,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Message>, ApiError>;

    async fn create_message(&self, input: &CreateMessage) -> Result<Message, ApiError>;

    async fn create_chat(&self, input: &CreateChat) -> Result<Chat, ApiError>;
}

/// The real-time channel. A connection yields events until the channel closes.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn connect(&self, token: &str) -> Result<mpsc::Receiver<SseMessage>, ApiError>;
}
