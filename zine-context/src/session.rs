use log::{debug, info, warn};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use zine_db::Database;
use zine_msg::{AuthResult, Credentials, OAuthProvider, SignUpInput, User};
use zine_ref::AuthorSlug;
use zine_store::ApiError;

use crate::{
    api::AuthApi,
    validation::{validate_credentials, validate_sign_up},
    Error,
};

/// Deferred action waiting for the user to sign in.
pub type AuthCallback = Box<dyn FnOnce() + Send>;

/// The signed in user, if any, with the token persisted in the database.
pub struct Session {
    api: Arc<dyn AuthApi>,
    db: Arc<AsyncMutex<Database>>,
    current: watch::Sender<Option<AuthResult>>,
    pending: Mutex<Option<AuthCallback>>,
    auth_modal: Mutex<Option<String>>,
    recheck: Duration,
}

impl Session {
    pub fn new(api: Arc<dyn AuthApi>, db: Arc<AsyncMutex<Database>>, recheck: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Session {
            api,
            db,
            current,
            pending: Mutex::new(None),
            auth_modal: Mutex::new(None),
            recheck,
        }
    }

    pub fn session(&self) -> Option<AuthResult> {
        self.current.borrow().clone()
    }

    /// Receiver that sees every session change.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthResult>> {
        self.current.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .and_then(|session| session.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.current
            .borrow()
            .as_ref()
            .and_then(|session| session.user.clone())
    }

    pub fn author_slug(&self) -> Option<AuthorSlug> {
        self.user().and_then(|user| user.slug)
    }

    pub fn author_id(&self) -> Option<i64> {
        self.user().map(|user| user.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.author_slug().is_some()
    }

    /// Source of the pending auth modal request, if one is open.
    pub fn auth_modal(&self) -> Option<String> {
        self.auth_modal.lock().clone()
    }

    pub fn close_auth_modal(&self) {
        self.auth_modal.lock().take();
    }

    /// Fetches the session for the stored token. A failed renew resets the
    /// stored token and leaves the client signed out.
    pub async fn load_session(&self) -> Result<Option<AuthResult>, Error> {
        let token = self.db.lock().await.get_token().await?;
        match self.api.get_session(token.as_deref()).await {
            Ok(Some(session)) if session.token.is_some() => {
                self.accept(session.clone()).await?;
                Ok(Some(session))
            }
            Ok(_) => {
                debug!("No session");
                self.current.send_replace(None);
                Ok(None)
            }
            Err(err) => {
                warn!("Session renew failed: {}", err);
                self.db.lock().await.reset_token().await?;
                self.current.send_replace(None);
                Ok(None)
            }
        }
    }

    /// Signs in. On failure the current session is left as it was.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthResult, Error> {
        validate_credentials(credentials)?;
        let session = checked(self.api.login(credentials).await?)?;
        self.accept(session.clone()).await?;
        info!("Signed in");
        Ok(session)
    }

    /// Registers a user. The session starts only if the backend returns one
    /// right away, otherwise the email has to be confirmed first.
    pub async fn sign_up(&self, input: &SignUpInput) -> Result<AuthResult, Error> {
        validate_sign_up(input)?;
        let result = checked(self.api.signup(input).await?)?;
        if result.token.is_some() && result.user.is_some() {
            self.accept(result.clone()).await?;
            info!("Signed up and signed in");
        }
        Ok(result)
    }

    pub async fn sign_out(&self) -> Result<(), Error> {
        if let Some(token) = self.token() {
            if let Err(err) = self.api.logout(&token).await {
                warn!("Logout call failed: {}", err);
            }
        }
        self.db.lock().await.reset_token().await?;
        self.current.send_replace(None);
        info!("Signed out");
        Ok(())
    }

    pub async fn confirm_email(&self, token: &str) -> Result<AuthResult, Error> {
        let session = checked(self.api.verify_email(token).await?)?;
        self.accept(session.clone()).await?;
        info!("Email confirmed");
        Ok(session)
    }

    pub async fn oauth(&self, provider: OAuthProvider) -> Result<AuthResult, Error> {
        let session = checked(self.api.oauth_login(provider).await?)?;
        self.accept(session.clone()).await?;
        info!("Signed in with {}", provider);
        Ok(session)
    }

    /// Runs `callback` now when signed in. Otherwise keeps it, replacing any
    /// earlier one, asks for the auth modal with `source`, and runs it once
    /// the next session starts. Returns whether it ran immediately.
    pub fn require_authentication(&self, callback: AuthCallback, source: &str) -> bool {
        if self.is_authenticated() {
            callback();
            return true;
        }
        *self.pending.lock() = Some(callback);
        *self.auth_modal.lock() = Some(source.to_string());
        debug!("Authentication required by {}", source);
        false
    }

    /// Re-checks the session every recheck interval until one exists.
    /// Returns false when cancelled first.
    pub async fn recheck_until_authenticated(&self, cancel: &CancellationToken) -> bool {
        loop {
            if self.is_authenticated() {
                return true;
            }
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.recheck) => {}
            }
            if let Err(err) = self.load_session().await {
                warn!("Session recheck failed: {}", err);
            }
        }
    }

    async fn accept(&self, session: AuthResult) -> Result<(), Error> {
        if let Some(token) = &session.token {
            self.db.lock().await.set_token(token).await?;
        }
        self.current.send_replace(Some(session));
        if self.is_authenticated() {
            self.close_auth_modal();
            let callback = self.pending.lock().take();
            if let Some(callback) = callback {
                callback();
            }
        }
        Ok(())
    }
}

/// Turns an error carried inside an auth result into an api error.
fn checked(result: AuthResult) -> Result<AuthResult, Error> {
    match &result.error {
        Some(code) => Err(ApiError::with_code(code.as_str(), code.as_str()).into()),
        None => Ok(result),
    }
}
