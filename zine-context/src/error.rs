use std::io;
use thiserror::Error as ThisError;
use zine_store::ApiError;

use crate::validation::FieldError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] zine_store::Error),
    #[error("Db error, cause: {0}")]
    Db(#[from] zine_db::Error),
    #[error("Invalid input: {}", describe(.0))]
    Validation(Vec<FieldError>),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Real-time connection closed after {0} reconnects")]
    ConnectionClosed(u32),
    #[error("Failed to read config, cause: {0}")]
    ReadConfig(#[source] io::Error),
    #[error("Failed to parse config, cause: {0}")]
    ParseConfig(#[from] toml::de::Error),
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// The backend error behind this one, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(error) => Some(error),
            Error::Store(error) => error.api_error(),
            _ => None,
        }
    }

    /// Whether a load was dropped on purpose rather than failing.
    pub fn is_discarded(&self) -> bool {
        matches!(self, Error::Store(error) if error.is_discarded())
    }
}
