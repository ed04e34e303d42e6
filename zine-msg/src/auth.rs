use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError};
use std::fmt;
use zine_ref::AuthorSlug;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    /// Same id as the user's author profile.
    pub id: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub slug: Option<AuthorSlug>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub email: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub email_confirmed: Option<bool>,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AuthResult {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub token: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub user: Option<User>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Facebook,
    Google,
    Github,
    Vk,
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OAuthProvider::Facebook => "facebook",
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
            OAuthProvider::Vk => "vk",
        };
        f.write_str(name)
    }
}
