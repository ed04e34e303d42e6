use thiserror::Error as ThisError;

use crate::api::ApiError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Can't load {entity}, slug not found: {slug}")]
    NotFound { entity: &'static str, slug: String },
    #[error("Load was cancelled")]
    Cancelled,
    #[error("Response superseded by a newer request for {0}")]
    Superseded(String),
    #[error("Json error, cause: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the response was dropped on purpose rather than failed.
    pub fn is_discarded(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Superseded(_))
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(error) => Some(error),
            _ => None,
        }
    }
}
