use itertools::Itertools;
use log::warn;
use zine_msg::{Author, Notification, Reaction, ShoutRef};
use zine_ref::{ReactionId, ShoutSlug};

/// Thread key a reaction notification is grouped under.
pub fn thread_id(slug: &ShoutSlug, reply_to: Option<ReactionId>, seen: bool) -> String {
    let mut thread = slug.as_str().to_string();
    if let Some(reply_to) = reply_to {
        thread.push_str("__");
        thread.push_str(&reply_to.to_string());
    }
    if seen {
        thread.push_str("::seen");
    }
    thread
}

/// Reaction notifications about one shout or comment, as shown in the panel.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationGroup {
    pub thread: String,
    pub shout: ShoutRef,
    pub reply_to: Option<ReactionId>,
    /// Newest first.
    pub reactions: Vec<Reaction>,
    /// Distinct reacting authors, most recent first.
    pub authors: Vec<Author>,
    pub updated_at: i64,
    pub seen: bool,
    pub notification_ids: Vec<i64>,
}

impl NotificationGroup {
    pub fn latest(&self) -> Option<&Reaction> {
        self.reactions.first()
    }
}

/// Groups reaction notifications into threads, newest thread first.
///
/// A notification counts as seen when `viewer` is in its `seen` list, and seen
/// notifications land in a separate thread from unseen ones.
pub fn group_notifications(
    notifications: &[Notification],
    viewer: Option<i64>,
) -> Vec<NotificationGroup> {
    let mut groups: Vec<NotificationGroup> = Vec::new();

    for notification in notifications {
        let reaction = match notification.reaction() {
            Ok(Some(reaction)) => reaction,
            Ok(None) => continue,
            Err(err) => {
                warn!("Skipping notification {}: {}", notification.id, err);
                continue;
            }
        };
        let seen = viewer
            .map(|author_id| notification.is_seen_by(author_id))
            .unwrap_or(false);
        let thread = thread_id(&reaction.shout.slug, reaction.reply_to, seen);

        match groups.iter_mut().find(|group| group.thread == thread) {
            Some(group) => {
                group.notification_ids.push(notification.id);
                group.reactions.push(reaction);
            }
            None => groups.push(NotificationGroup {
                thread,
                shout: reaction.shout.clone(),
                reply_to: reaction.reply_to,
                reactions: vec![reaction],
                authors: Vec::new(),
                updated_at: 0,
                seen,
                notification_ids: vec![notification.id],
            }),
        }
    }

    for group in groups.iter_mut() {
        group
            .reactions
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
        group.updated_at = group
            .reactions
            .iter()
            .map(|reaction| reaction.created_at)
            .max()
            .unwrap_or(0);
        group.authors = group
            .reactions
            .iter()
            .map(|reaction| reaction.created_by.clone())
            .unique_by(|author| author.slug.clone())
            .collect();
    }

    groups.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    groups
}
