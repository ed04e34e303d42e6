use log::{debug, warn};
use parking_lot::RwLock;
use std::{cmp::Reverse, sync::Arc};
use tokio::sync::Mutex as AsyncMutex;
use zine_db::Database;
use zine_msg::{Notification, SseMessage};
use zine_store::{entity::EntityMap, group_notifications, NotificationGroup};

use crate::{api::NotifierApi, session::Session, Error};

pub const PAGE_SIZE: u32 = 20;

#[derive(Default)]
struct State {
    entities: EntityMap<Notification>,
    total: i64,
    unread: i64,
    panel_open: bool,
}

/// The signed in user's notifications and the panel showing them.
pub struct Notifications {
    api: Arc<dyn NotifierApi>,
    session: Arc<Session>,
    db: Arc<AsyncMutex<Database>>,
    page_size: u32,
    state: RwLock<State>,
}

impl Notifications {
    pub fn new(
        api: Arc<dyn NotifierApi>,
        session: Arc<Session>,
        db: Arc<AsyncMutex<Database>>,
        page_size: u32,
    ) -> Self {
        Notifications {
            api,
            session,
            db,
            page_size,
            state: RwLock::new(State::default()),
        }
    }

    /// Loads a page and merges it. Nothing is loaded while signed out.
    pub async fn load_notifications(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Notification>, Error> {
        if !self.session.is_authenticated() {
            return Ok(Vec::new());
        }
        let result = self.api.load_notifications(limit, offset).await?;
        debug!(
            "Loaded {} notifications, {} unread of {}",
            result.notifications.len(),
            result.unread,
            result.total
        );
        let mut state = self.state.write();
        state.entities.merge(result.notifications.clone());
        state.total = result.total;
        state.unread = result.unread;
        Ok(result.notifications)
    }

    pub fn sorted_notifications(&self) -> Vec<Notification> {
        let mut notifications = self.state.read().entities.to_vec();
        notifications.sort_by_key(|notification| Reverse(notification.created_at));
        notifications
    }

    /// Loaded reaction notifications grouped by thread for the viewer.
    pub fn groups(&self) -> Vec<NotificationGroup> {
        group_notifications(&self.sorted_notifications(), self.session.author_id())
    }

    pub async fn mark_notification_as_read(&self, id: i64) -> Result<(), Error> {
        let viewer = self.session.author_id().ok_or(Error::NotAuthenticated)?;
        self.api.mark_notification_as_read(id).await?;
        self.mark_seen_locally(&[id], viewer);
        Ok(())
    }

    /// Marks everything read on the backend, reloads what was loaded and
    /// moves the notifier cursor to the newest notification.
    pub async fn mark_all_notifications_as_read(&self) -> Result<(), Error> {
        if !self.session.is_authenticated() {
            return Ok(());
        }
        self.api.mark_all_notifications_as_read().await?;
        let limit = self.page_size.max(self.loaded_count() as u32);
        self.load_notifications(limit, 0).await?;

        let newest = self
            .state
            .read()
            .entities
            .values()
            .map(|notification| notification.created_at)
            .max();
        if let Some(newest) = newest {
            self.db.lock().await.set_notifier_timestamp(newest).await?;
        }
        Ok(())
    }

    /// Marks every loaded notification of `thread` as seen.
    pub async fn mark_seen_thread(&self, thread: &str) -> Result<(), Error> {
        let viewer = self.session.author_id().ok_or(Error::NotAuthenticated)?;
        self.api.mark_thread_seen(thread).await?;
        let ids: Vec<i64> = self
            .groups()
            .into_iter()
            .filter(|group| group.thread == thread)
            .flat_map(|group| group.notification_ids)
            .collect();
        self.mark_seen_locally(&ids, viewer);
        Ok(())
    }

    fn mark_seen_locally(&self, ids: &[i64], viewer: i64) {
        let mut state = self.state.write();
        let mut newly_seen = 0;
        for id in ids {
            let Some(mut notification) = state.entities.get(id).cloned() else {
                continue;
            };
            if notification.is_seen_by(viewer) {
                continue;
            }
            notification.mark_seen_by(viewer);
            state.entities.insert(notification);
            newly_seen += 1;
        }
        state.unread = (state.unread - newly_seen).max(0);
    }

    pub fn unread_count(&self) -> i64 {
        self.state.read().unread
    }

    pub fn total_count(&self) -> i64 {
        self.state.read().total
    }

    pub fn loaded_count(&self) -> usize {
        self.state.read().entities.len()
    }

    pub fn show_panel(&self) {
        self.state.write().panel_open = true;
    }

    pub fn hide_panel(&self) {
        self.state.write().panel_open = false;
    }

    pub fn is_panel_open(&self) -> bool {
        self.state.read().panel_open
    }

    /// Reloads on reaction events so new activity shows up in the panel.
    pub async fn handle_event(&self, event: &SseMessage) -> Result<(), Error> {
        if event.entity == "reaction" && self.session.is_authenticated() {
            let limit = self.page_size.max(self.loaded_count() as u32);
            self.load_notifications(limit, 0).await?;
        } else {
            warn!(
                "Notifications: unhandled event {} {}",
                event.entity, event.action
            );
        }
        Ok(())
    }
}
