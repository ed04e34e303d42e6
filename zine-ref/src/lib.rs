use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};
use thiserror::Error as ThisError;
use urlencoding::encode;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefError {
    #[error("Does not match as {ref_type}: {input}")]
    BadFormat {
        ref_type: &'static str,
        input: String,
    },
}

lazy_static! {
    // letters of any script, digits, and the separators slugs are built with
    static ref SLUG_RE: Regex = Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N}_.\-]*$").unwrap();
    static ref CHAT_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").unwrap();
}

pub fn is_slug(string: &str) -> bool {
    SLUG_RE.is_match(string)
}

macro_rules! slug_ref {
    ($(#[$meta:meta])* $name:ident, $ref_type:literal, $page_prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn from_string(string: String) -> Result<Self, RefError> {
                if !Self::is_match(string.as_str()) {
                    Err(RefError::BadFormat {
                        ref_type: $ref_type,
                        input: string,
                    })
                } else {
                    Ok(Self(string))
                }
            }

            pub fn is_match(string: &str) -> bool {
                is_slug(string)
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn to_page_url(&self) -> String {
                format!("{}{}", $page_prefix, encode(self.0.as_str()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = RefError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $name::from_string(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = RefError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                $name::from_string(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl From<&$name> for String {
            fn from(value: &$name) -> String {
                value.0.clone()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

slug_ref!(
    /// Key of a published article.
    ShoutSlug,
    "Shout",
    "/"
);

slug_ref!(
    /// Key of an author profile.
    AuthorSlug,
    "Author",
    "/@"
);

slug_ref!(
    /// Key of a topic.
    TopicSlug,
    "Topic",
    "/topic/"
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ReactionId(pub i64);

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ReactionId {
    fn from(value: i64) -> Self {
        ReactionId(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChatId(String);

impl ChatId {
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !CHAT_ID_RE.is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Chat",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn to_page_url(&self) -> String {
        format!("/inbox/{}", encode(self.0.as_str()))
    }
}

impl TryFrom<String> for ChatId {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChatId::from_string(value)
    }
}

impl From<ChatId> for String {
    fn from(value: ChatId) -> String {
        value.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
