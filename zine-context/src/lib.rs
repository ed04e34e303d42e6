use chrono::Utc;
use log::{debug, info, warn};
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{broadcast::error::RecvError, Mutex as AsyncMutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use zine_db::Database;
use zine_msg::{AuthResult, Draft, EventContent, SseMessage, Topic};
use zine_ref::ShoutSlug;
use zine_store::{CoreApi, Zine};

pub mod api;
mod config;
pub mod connect;
mod error;
pub mod following;
pub mod inbox;
pub mod notifications;
pub mod session;
pub mod tasks;
pub mod validation;

#[cfg(test)]
mod testing;

pub use api::{AuthApi, EventSource, InboxApi, NotifierApi};
pub use config::Config;
pub use connect::ConnectHub;
pub use error::Error;
pub use following::Following;
pub use inbox::Inbox;
pub use notifications::Notifications;
pub use session::Session;
pub use tasks::spawn_logged;

/// The backend ports a client talks to.
#[derive(Clone)]
pub struct Ports {
    pub core: Arc<dyn CoreApi>,
    pub auth: Arc<dyn AuthApi>,
    pub notifier: Arc<dyn NotifierApi>,
    pub inbox: Arc<dyn InboxApi>,
    pub events: Arc<dyn EventSource>,
}

/// Everything one signed in (or anonymous) reader needs: the entity cache,
/// the session and the contexts built on it, all sharing one local database.
pub struct Client {
    config: Config,
    db: Arc<AsyncMutex<Database>>,
    zine: Arc<Zine>,
    session: Arc<Session>,
    notifications: Arc<Notifications>,
    inbox: Arc<Inbox>,
    following: Arc<Following>,
    connect: Arc<ConnectHub>,
}

impl Client {
    /// Opens the database named in `config`, in memory when there is none.
    pub async fn open(config: Config, ports: Ports) -> Result<Self, Error> {
        let path = config
            .database_path
            .clone()
            .unwrap_or_else(|| "sqlite::memory:".to_string());
        let db = Database::new(&path).await?;
        Ok(Self::new(config, ports, db))
    }

    pub fn new(config: Config, ports: Ports, db: Database) -> Self {
        let db = Arc::new(AsyncMutex::new(db));
        let zine = Arc::new(Zine::with_options(ports.core, config.zine_options()));
        let session = Arc::new(Session::new(
            ports.auth,
            db.clone(),
            config.session_recheck(),
        ));
        let notifications = Arc::new(Notifications::new(
            ports.notifier,
            session.clone(),
            db.clone(),
            config.notifications_page_size,
        ));
        let inbox = Arc::new(Inbox::new(ports.inbox, zine.clone()));
        let following = Arc::new(Following::new(zine.clone()));
        let connect = Arc::new(ConnectHub::new(ports.events, config.reconnect_times));
        Client {
            config,
            db,
            zine,
            session,
            notifications,
            inbox,
            following,
            connect,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn zine(&self) -> &Arc<Zine> {
        &self.zine
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn notifications(&self) -> &Arc<Notifications> {
        &self.notifications
    }

    pub fn inbox(&self) -> &Arc<Inbox> {
        &self.inbox
    }

    pub fn following(&self) -> &Arc<Following> {
        &self.following
    }

    pub fn connect(&self) -> &Arc<ConnectHub> {
        &self.connect
    }

    /// Loads the session and keeps the background work in step with it:
    /// the real-time connection, event routing and the first loads while
    /// signed in, the session recheck while signed out. Each sign in or sign
    /// out swaps one set for the other. Everything stops on `cancel`.
    pub async fn start(
        self: &Arc<Self>,
        cancel: &CancellationToken,
    ) -> Result<JoinHandle<()>, Error> {
        self.session.load_session().await?;
        let client = self.clone();
        let cancel = cancel.clone();
        Ok(spawn_logged("session lifecycle", client.follow_session(cancel)))
    }

    async fn follow_session(self: Arc<Self>, cancel: CancellationToken) -> Result<(), Error> {
        let mut sessions = self.session.subscribe();
        loop {
            let token = signed_in_token(&sessions.borrow_and_update());
            let scope = cancel.child_token();
            let tasks = match &token {
                Some(token) => self.start_signed_in(token.clone(), &scope),
                None => self.start_signed_out(&scope),
            };

            let stopped = loop {
                let changed = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break true,
                    changed = sessions.changed() => changed,
                };
                if changed.is_err() {
                    break true;
                }
                if signed_in_token(&sessions.borrow_and_update()) != token {
                    break false;
                }
            };

            scope.cancel();
            for task in tasks {
                let _ = task.await;
            }
            if stopped {
                return Ok(());
            }
        }
    }

    fn start_signed_out(&self, scope: &CancellationToken) -> Vec<JoinHandle<()>> {
        info!("Signed out, rechecking session");
        let session = self.session.clone();
        let scope = scope.clone();
        vec![spawn_logged("session recheck", async move {
            session.recheck_until_authenticated(&scope).await;
            Ok(())
        })]
    }

    fn start_signed_in(
        self: &Arc<Self>,
        token: String,
        scope: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        info!("Signed in, connecting");
        let events = self.connect.subscribe();
        vec![
            spawn_logged("event routing", {
                let client = self.clone();
                let scope = scope.clone();
                async move { client.route_events(events, &scope).await }
            }),
            spawn_logged("real-time connection", {
                let connect = self.connect.clone();
                let scope = scope.clone();
                async move { connect.run(&token, &scope).await }
            }),
            spawn_logged("subscriptions", {
                let following = self.following.clone();
                async move { following.load_subscriptions().await.map(|_| ()) }
            }),
            spawn_logged("notifications", {
                let notifications = self.notifications.clone();
                let limit = self.config.notifications_page_size;
                async move { notifications.load_notifications(limit, 0).await.map(|_| ()) }
            }),
        ]
    }

    /// Routes events until cancelled. A failing handler only loses its own
    /// event.
    async fn route_events(
        &self,
        mut events: tokio::sync::broadcast::Receiver<SseMessage>,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                event = events.recv() => event,
            };
            match event {
                Ok(event) => {
                    if let Err(err) = self.handle_event(&event).await {
                        warn!("Event {} {} failed: {}", event.entity, event.action, err);
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} events", skipped),
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }

    /// Applies one server event to the store or context it concerns.
    pub async fn handle_event(&self, event: &SseMessage) -> Result<(), Error> {
        match event.content() {
            EventContent::Reaction(reaction) => {
                self.zine.add_reactions(vec![reaction]);
                self.notifications.handle_event(event).await?;
            }
            EventContent::Shout(shout) => self.zine.add_shouts(vec![shout]),
            EventContent::Follower(author) => self.zine.add_authors(vec![author]),
            EventContent::Message(_) | EventContent::Chat(_) => {
                self.inbox.handle_event(event);
            }
            EventContent::Unknown => {
                warn!("Unhandled event {} {}", event.entity, event.action)
            }
        }
        Ok(())
    }

    // seen shouts

    pub async fn mark_seen(&self, slug: &ShoutSlug) -> Result<(), Error> {
        let now = Utc::now().timestamp_millis();
        Ok(self.db.lock().await.add_seen(slug, now).await?)
    }

    pub async fn seen_at(&self, slug: &ShoutSlug) -> Result<Option<i64>, Error> {
        Ok(self.db.lock().await.get_seen_at(slug).await?)
    }

    pub async fn seen(&self) -> Result<HashMap<String, i64>, Error> {
        Ok(self.db.lock().await.get_seen().await?)
    }

    // drafts

    /// Saves a draft, stamping it with the current time.
    pub async fn save_draft(&self, draft: &Draft) -> Result<Draft, Error> {
        let draft = Draft {
            updated_at: Utc::now().timestamp_millis(),
            ..draft.clone()
        };
        Ok(self.db.lock().await.save_draft(&draft).await?)
    }

    pub async fn drafts(&self) -> Result<Vec<Draft>, Error> {
        Ok(self.db.lock().await.get_drafts().await?)
    }

    pub async fn remove_draft(&self, id: i64) -> Result<bool, Error> {
        Ok(self.db.lock().await.remove_draft(id).await?)
    }

    pub async fn notifier_timestamp(&self) -> Result<Option<i64>, Error> {
        Ok(self.db.lock().await.get_notifier_timestamp().await?)
    }

    // topics cache

    /// All topics, from the local cache while it is fresh.
    pub async fn load_all_topics_cached(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Topic>, Error> {
        let now = Utc::now().timestamp_millis();
        let cached = self
            .db
            .lock()
            .await
            .get_cached_topics(now, self.config.topics_cache_max_age_ms)
            .await?;
        if let Some(topics) = cached {
            debug!("Using {} cached topics", topics.len());
            self.zine.add_topics(topics.clone());
            return Ok(topics);
        }

        let topics = self.zine.load_all_topics(cancel).await?;
        self.db
            .lock()
            .await
            .set_cached_topics(&topics, now)
            .await?;
        Ok(topics)
    }

    /// Recomputes the top lists from the shouts in the feed.
    pub fn refresh_tops(&self) {
        let shouts = self.zine.sorted_shouts();
        self.zine.set_tops(&shouts, Utc::now().timestamp());
    }
}

/// The token of a session with a known author, the only kind that gets
/// the signed in background work.
fn signed_in_token(session: &Option<AuthResult>) -> Option<String> {
    let session = session.as_ref()?;
    session.user.as_ref()?.slug.as_ref()?;
    session.token.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{sync::atomic::Ordering, time::Duration};
    use zine_msg::{Credentials, Layout};
    use zine_ref::{ReactionId, TopicSlug};

    use crate::{
        session::tests::{auth_result, MockAuth},
        testing::MockCore,
    };

    async fn client_with(backend: Arc<MockCore>, auth: Arc<MockAuth>) -> Arc<Client> {
        let ports = Ports {
            core: backend.clone(),
            auth,
            notifier: backend.clone(),
            inbox: backend.clone(),
            events: backend,
        };
        let config = Config {
            reconnect_times: 0,
            ..Config::default()
        };
        Arc::new(Client::open(config, ports).await.unwrap())
    }

    fn event(entity: &str, payload: serde_json::Value) -> SseMessage {
        serde_json::from_value(json!({ "entity": entity, "action": "create", "payload": payload }))
            .unwrap()
    }

    fn reaction(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "kind": "LIKE",
            "created_by": { "id": 2, "slug": "zoe" },
            "shout": { "slug": "foo" },
            "created_at": 10,
        })
    }

    #[tokio::test]
    async fn events_are_routed_by_entity() {
        let client = client_with(Arc::new(MockCore::default()), Arc::new(MockAuth::default())).await;

        client.handle_event(&event("reaction", reaction(5))).await.unwrap();
        assert!(client.zine().reaction(ReactionId(5)).is_some());

        let message = json!({ "id": 1, "chat_id": "a", "created_by": 2, "created_at": 5 });
        client.handle_event(&event("message", message)).await.unwrap();
        assert_eq!(client.inbox().messages().len(), 1);

        let follower = json!({ "id": 3, "slug": "kim" });
        client.handle_event(&event("follower", follower)).await.unwrap();
        assert_eq!(client.zine().sorted_authors().len(), 1);

        client
            .handle_event(&event("weather", json!({})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn topics_come_from_cache_while_fresh() {
        let backend = Arc::new(MockCore::default());
        *backend.topics.lock() =
            vec![serde_json::from_value(json!({ "id": 1, "slug": "art", "title": "Art" })).unwrap()];
        let client = client_with(backend.clone(), Arc::new(MockAuth::default())).await;
        let cancel = CancellationToken::new();

        assert_eq!(client.load_all_topics_cached(&cancel).await.unwrap().len(), 1);
        assert_eq!(client.load_all_topics_cached(&cancel).await.unwrap().len(), 1);
        assert_eq!(backend.topic_calls.load(Ordering::SeqCst), 1);
        let art = TopicSlug::try_from("art").unwrap();
        assert!(client.zine().topic(&art).is_some());
    }

    #[tokio::test]
    async fn seen_and_drafts_persist() {
        let client = client_with(Arc::new(MockCore::default()), Arc::new(MockAuth::default())).await;
        let slug = ShoutSlug::try_from("foo").unwrap();
        assert_eq!(client.seen_at(&slug).await.unwrap(), None);
        client.mark_seen(&slug).await.unwrap();
        assert!(client.seen_at(&slug).await.unwrap().is_some());
        assert_eq!(client.seen().await.unwrap().len(), 1);

        let draft = Draft {
            id: None,
            slug: None,
            title: "Untitled".to_string(),
            subtitle: None,
            body: String::new(),
            layout: Layout::default(),
            updated_at: 0,
        };
        let saved = client.save_draft(&draft).await.unwrap();
        assert!(saved.updated_at > 0);
        let id = saved.id.unwrap();
        assert_eq!(client.drafts().await.unwrap().len(), 1);
        assert!(client.remove_draft(id).await.unwrap());
        assert!(client.drafts().await.unwrap().is_empty());
    }

    async fn eventually(check: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    fn signed_in_auth() -> Arc<MockAuth> {
        let auth = Arc::new(MockAuth::default());
        *auth.session.lock() = Some(auth_result("token", 1, "anna"));
        auth
    }

    #[tokio::test]
    async fn signed_in_start_loads_subscriptions() {
        let backend = Arc::new(MockCore::default());
        *backend.subscriptions.lock() = Some(Default::default());
        let client = client_with(backend.clone(), signed_in_auth()).await;
        let cancel = CancellationToken::new();

        let lifecycle = client.start(&cancel).await.unwrap();
        assert!(client.session().is_authenticated());
        eventually(|| {
            client.following().is_loaded() && backend.notification_calls.load(Ordering::SeqCst) == 1
        })
        .await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), lifecycle)
            .await
            .unwrap()
            .unwrap();
        assert!(!client.connect().is_connected());
    }

    #[tokio::test]
    async fn signed_out_start_only_rechecks() {
        let backend = Arc::new(MockCore::default());
        let client = client_with(backend.clone(), Arc::new(MockAuth::default())).await;
        let cancel = CancellationToken::new();
        let lifecycle = client.start(&cancel).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), lifecycle)
            .await
            .unwrap()
            .unwrap();
        assert!(!client.following().is_loaded());
        assert_eq!(backend.notification_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn signing_in_later_starts_the_signed_in_work() {
        let backend = Arc::new(MockCore::default());
        *backend.subscriptions.lock() = Some(Default::default());
        let client = client_with(backend.clone(), Arc::new(MockAuth::default())).await;
        let cancel = CancellationToken::new();
        let lifecycle = client.start(&cancel).await.unwrap();
        assert!(!client.session().is_authenticated());

        let credentials = Credentials {
            email: "anna@example.com".to_string(),
            password: "secret".to_string(),
        };
        client.session().sign_in(&credentials).await.unwrap();
        eventually(|| {
            client.following().is_loaded() && backend.notification_calls.load(Ordering::SeqCst) == 1
        })
        .await;

        client
            .connect()
            .dispatch(event("follower", json!({ "id": 3, "slug": "kim" })));
        eventually(|| client.zine().sorted_authors().len() == 1).await;

        // signing out drops the event routing
        client.session().sign_out().await.unwrap();
        eventually(|| client.connect().dispatch(event("weather", json!({}))) == 0).await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), lifecycle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn routing_survives_a_failing_handler() {
        let backend = Arc::new(MockCore::default());
        let client = client_with(backend.clone(), signed_in_auth()).await;
        client.session().load_session().await.unwrap();
        backend.notification_failures.store(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();

        let events = client.connect().subscribe();
        let routing = tokio::spawn({
            let client = client.clone();
            let cancel = cancel.clone();
            async move { client.route_events(events, &cancel).await }
        });
        client.connect().dispatch(event("reaction", reaction(5)));
        client.connect().dispatch(event("reaction", reaction(6)));

        eventually(|| backend.notification_calls.load(Ordering::SeqCst) == 2).await;
        assert!(client.zine().reaction(ReactionId(5)).is_some());
        assert!(client.zine().reaction(ReactionId(6)).is_some());

        cancel.cancel();
        assert!(routing.await.unwrap().is_ok());
    }
}
