use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;
use zine_msg::{
    Author, AuthorsBy, FollowingEntity, LoadShoutsOptions, Reaction, ReactionInput, ReactionsBy,
    SearchOptions, Shout, Subscriptions, Topic,
};
use zine_ref::{AuthorSlug, ReactionId, ShoutSlug, TopicSlug};

/// Error codes the backend attaches to failed calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    EmailNotConfirmed,
    UserNotFound,
    UserAlreadyExists,
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::EmailNotConfirmed => "email_not_confirmed",
            ErrorCode::UserNotFound => "user_not_found",
            ErrorCode::UserAlreadyExists => "user_already_exists",
            ErrorCode::Other(code) => code.as_str(),
        }
    }

    /// Text shown to the user for this code.
    pub fn user_message(&self) -> &str {
        match self {
            ErrorCode::EmailNotConfirmed => "Please confirm your email to continue",
            ErrorCode::UserNotFound => "Something went wrong, check email and password",
            ErrorCode::UserAlreadyExists => "User with this email already exists",
            ErrorCode::Other(_) => "Something went wrong, try again later",
        }
    }
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "email_not_confirmed" => ErrorCode::EmailNotConfirmed,
            "user_not_found" => ErrorCode::UserNotFound,
            "user_already_exists" => ErrorCode::UserAlreadyExists,
            _ => ErrorCode::Other(value),
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(value: &str) -> Self {
        ErrorCode::from(value.to_string())
    }
}

impl From<ErrorCode> for String {
    fn from(value: ErrorCode) -> String {
        value.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed backend call, as surfaced by any api port.
#[derive(Clone, Debug, PartialEq, Eq, ThisError, Deserialize, Serialize)]
#[error("Api error{}: {message}", code_suffix(.code))]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<ErrorCode>,
    pub message: String,
}

fn code_suffix(code: &Option<ErrorCode>) -> String {
    match code {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        ApiError {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        ApiError {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &str {
        match &self.code {
            Some(code) => code.user_message(),
            None => self.message.as_str(),
        }
    }
}

/// The core backend: shouts, authors, topics, reactions and follows.
#[async_trait]
pub trait CoreApi: Send + Sync {
    async fn get_shouts(&self, options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError>;

    async fn get_my_feed(&self, options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError>;

    async fn get_shouts_search(&self, options: &SearchOptions) -> Result<Vec<Shout>, ApiError>;

    async fn get_shout(&self, slug: &ShoutSlug) -> Result<Option<Shout>, ApiError>;

    async fn get_author(&self, slug: &AuthorSlug) -> Result<Option<Author>, ApiError>;

    async fn get_all_authors(&self) -> Result<Vec<Author>, ApiError>;

    async fn load_authors_by(
        &self,
        by: &AuthorsBy,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Author>, ApiError>;

    async fn get_all_topics(&self) -> Result<Vec<Topic>, ApiError>;

    async fn get_random_topics(&self, amount: u32) -> Result<Vec<Topic>, ApiError>;

    async fn get_topic(&self, slug: &TopicSlug) -> Result<Option<Topic>, ApiError>;

    async fn load_reactions_by(
        &self,
        by: &ReactionsBy,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Reaction>, ApiError>;

    async fn create_reaction(&self, input: &ReactionInput) -> Result<Reaction, ApiError>;

    async fn update_reaction(&self, input: &ReactionInput) -> Result<Reaction, ApiError>;

    async fn delete_reaction(&self, id: ReactionId) -> Result<(), ApiError>;

    async fn follow(&self, what: FollowingEntity, slug: &str) -> Result<(), ApiError>;

    async fn unfollow(&self, what: FollowingEntity, slug: &str) -> Result<(), ApiError>;

    async fn get_my_subscriptions(&self) -> Result<Subscriptions, ApiError>;
}
