use itertools::Itertools;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use zine_msg::{Reaction, ReactionKind};
use zine_ref::{ReactionId, ShoutSlug};

use crate::entity::EntityMap;

/// A reaction with the replies nested under it.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionNode {
    pub reaction: Reaction,
    pub replies: Vec<ReactionNode>,
}

#[derive(Debug, Default)]
pub struct ReactionsStore {
    entities: EntityMap<Reaction>,
    sorted: Vec<ReactionId>,
    by_shout: HashMap<ShoutSlug, Vec<ReactionId>>,
    by_author: HashMap<i64, Vec<ReactionId>>,
}

impl ReactionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reactions: Vec<Reaction>) -> usize {
        if reactions.is_empty() {
            return 0;
        }
        let merged = self.entities.merge(reactions);
        trace!("Merged {} reactions, {} known", merged, self.entities.len());
        self.recompute();
        merged
    }

    pub fn remove(&mut self, id: ReactionId) -> Option<Reaction> {
        let removed = self.entities.remove(&id)?;
        self.recompute();
        Some(removed)
    }

    /// Stores a freshly created reaction. A like or dislike replaces the
    /// opposite vote by the same author on the same shout and reply target,
    /// which is returned.
    pub fn apply_created(&mut self, reaction: Reaction) -> Option<Reaction> {
        let opposite = reaction.kind.opposite_vote().and_then(|opposite| {
            self.entities
                .values()
                .find(|known| {
                    known.kind == opposite
                        && known.created_by.slug == reaction.created_by.slug
                        && known.shout.slug == reaction.shout.slug
                        && known.reply_to == reaction.reply_to
                })
                .map(|known| known.id)
        });
        let removed = opposite.and_then(|id| self.entities.remove(&id));
        if let Some(removed) = &removed {
            debug!(
                "Vote {:?} replaces {:?} on {}",
                reaction.kind, removed.kind, reaction.shout.slug
            );
        }
        self.entities.insert(reaction);
        self.recompute();
        removed
    }

    fn recompute(&mut self) {
        self.by_shout.clear();
        self.by_author.clear();

        for reaction in self.entities.values() {
            self.by_shout
                .entry(reaction.shout.slug.clone())
                .or_default()
                .push(reaction.id);
            self.by_author
                .entry(reaction.created_by.id)
                .or_default()
                .push(reaction.id);
        }

        self.sorted = self
            .entities
            .values()
            .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
            .map(|reaction| reaction.id)
            .collect();
    }

    pub fn get(&self, id: ReactionId) -> Option<&Reaction> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All reactions, newest first.
    pub fn sorted(&self) -> Vec<Reaction> {
        self.entities.resolve(&self.sorted)
    }

    pub fn by_shout(&self, slug: &ShoutSlug) -> Vec<Reaction> {
        self.by_shout
            .get(slug)
            .map(|ids| self.entities.resolve(ids))
            .unwrap_or_default()
    }

    pub fn by_author(&self, author_id: i64) -> Vec<Reaction> {
        self.by_author
            .get(&author_id)
            .map(|ids| self.entities.resolve(ids))
            .unwrap_or_default()
    }

    pub fn comments_by_author(&self, author_id: i64) -> Vec<Reaction> {
        self.by_author(author_id)
            .into_iter()
            .filter(|reaction| reaction.kind == ReactionKind::Comment)
            .collect()
    }

    /// Comment tree of a shout, oldest first at every level.
    pub fn thread(&self, slug: &ShoutSlug) -> Vec<ReactionNode> {
        let mut comments: Vec<Reaction> = self
            .by_shout(slug)
            .into_iter()
            .filter(|reaction| reaction.kind == ReactionKind::Comment)
            .collect();
        comments.sort_by_key(|reaction| reaction.created_at);
        nest_replies(&comments)
    }
}

/// Nests replies under their parents. A reply whose parent is not in
/// `reactions` stays top-level, as does any reaction caught in a reply cycle.
pub fn nest_replies(reactions: &[Reaction]) -> Vec<ReactionNode> {
    let ids: HashSet<ReactionId> = reactions.iter().map(|reaction| reaction.id).collect();
    let mut children: HashMap<ReactionId, Vec<&Reaction>> = HashMap::new();
    let mut roots = Vec::new();

    for reaction in reactions {
        match reaction.reply_to {
            Some(parent) if parent != reaction.id && ids.contains(&parent) => {
                children.entry(parent).or_default().push(reaction)
            }
            _ => roots.push(reaction),
        }
    }

    let mut visited = HashSet::new();
    let mut nodes = Vec::new();
    for root in roots {
        nodes.push(build_node(root, &children, &mut visited));
    }
    for reaction in reactions {
        if !visited.contains(&reaction.id) {
            nodes.push(build_node(reaction, &children, &mut visited));
        }
    }
    nodes
}

struct Frame<'a> {
    reaction: &'a Reaction,
    next: usize,
    replies: Vec<ReactionNode>,
}

impl<'a> Frame<'a> {
    fn new(reaction: &'a Reaction) -> Self {
        Frame {
            reaction,
            next: 0,
            replies: Vec::new(),
        }
    }
}

/// Builds the subtree under `root` depth first with an explicit stack, so
/// reply chains of any depth fit.
fn build_node(
    root: &Reaction,
    children: &HashMap<ReactionId, Vec<&Reaction>>,
    visited: &mut HashSet<ReactionId>,
) -> ReactionNode {
    visited.insert(root.id);
    let mut stack = vec![Frame::new(root)];
    let mut built = None;
    while let Some(frame) = stack.last_mut() {
        let replies = children
            .get(&frame.reaction.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(child) = replies.get(frame.next) {
            frame.next += 1;
            if visited.insert(child.id) {
                stack.push(Frame::new(*child));
            }
            continue;
        }
        if let Some(done) = stack.pop() {
            let node = ReactionNode {
                reaction: done.reaction.clone(),
                replies: done.replies,
            };
            match stack.last_mut() {
                Some(parent) => parent.replies.push(node),
                None => built = Some(node),
            }
        }
    }
    built.unwrap_or_else(|| ReactionNode {
        reaction: root.clone(),
        replies: Vec::new(),
    })
}
