use chrono::{Duration, Utc};
use log::{debug, trace};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use zine_msg::{
    Author, AuthorsBy, Layout, LoadShoutsOptions, Metric, Reaction, ReactionInput, ReactionsBy,
    SearchOptions, Shout, ShoutsFilters, Topic,
};
use zine_ref::{AuthorSlug, ReactionId, ShoutSlug, TopicSlug};

pub mod api;
pub mod entity;
mod error;
pub mod group;
pub mod notifications;
pub mod page;
pub mod request;
pub mod sort;
pub mod top;

mod authors;
mod reactions;
mod shouts;
mod topics;

pub use api::{ApiError, CoreApi, ErrorCode};
pub use authors::AuthorsStore;
pub use error::Error;
pub use notifications::{group_notifications, thread_id, NotificationGroup};
pub use page::Page;
pub use reactions::{nest_replies, ReactionNode, ReactionsStore};
pub use shouts::{authors_by_topic, topics_by_author, ShoutsStore};
pub use sort::{AuthorsSortBy, TopicsSortBy};
pub use top::Tops;
pub use topics::TopicsStore;

use page::{request_limit, split_page};
use request::{request_key, until_cancelled, RequestSequencer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZineOptions {
    pub reactions_per_page: u32,
    pub top_count: u32,
    pub top_month_days: i64,
    pub top_authors: usize,
}

impl Default for ZineOptions {
    fn default() -> Self {
        ZineOptions {
            reactions_per_page: 100,
            top_count: 10,
            top_month_days: 30,
            top_authors: 5,
        }
    }
}

/// The entity cache of one client: every store, the core api they load from,
/// and a revision counter bumped on each change.
///
/// Locks are taken in the order shouts, authors, topics, reactions and are
/// never held across an await.
pub struct Zine {
    api: Arc<dyn CoreApi>,
    options: ZineOptions,
    shouts: RwLock<ShoutsStore>,
    authors: RwLock<AuthorsStore>,
    topics: RwLock<TopicsStore>,
    reactions: RwLock<ReactionsStore>,
    tops: RwLock<Tops>,
    requests: RequestSequencer,
    revision: watch::Sender<u64>,
}

impl Zine {
    pub fn new(api: Arc<dyn CoreApi>) -> Self {
        Self::with_options(api, ZineOptions::default())
    }

    pub fn with_options(api: Arc<dyn CoreApi>, options: ZineOptions) -> Self {
        let (revision, _) = watch::channel(0);
        Zine {
            api,
            options,
            shouts: RwLock::new(ShoutsStore::new()),
            authors: RwLock::new(AuthorsStore::new()),
            topics: RwLock::new(TopicsStore::new()),
            reactions: RwLock::new(ReactionsStore::new()),
            tops: RwLock::new(Tops::default()),
            requests: RequestSequencer::new(),
            revision,
        }
    }

    pub fn api(&self) -> &Arc<dyn CoreApi> {
        &self.api
    }

    pub fn options(&self) -> &ZineOptions {
        &self.options
    }

    /// Receiver that sees a new revision after every store change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn changed(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    // merges

    /// Merges shouts and feeds the author and topic indices from them.
    pub fn add_shouts(&self, shouts: Vec<Shout>) {
        if shouts.is_empty() {
            return;
        }
        let by_topic = authors_by_topic(&shouts);
        let by_author = topics_by_author(&shouts);

        let ratings = {
            let mut store = self.shouts.write();
            store.add(shouts);
            store.ratings_by_author()
        };
        {
            let mut authors = self.authors.write();
            authors.add_by_topic(by_topic);
            authors.set_top(&ratings, self.options.top_authors);
        }
        self.topics.write().add_by_author(by_author);
        self.changed();
    }

    pub fn add_authors(&self, authors: Vec<Author>) {
        if authors.is_empty() {
            return;
        }
        let ratings = self.shouts.read().ratings_by_author();
        {
            let mut store = self.authors.write();
            store.add(authors);
            store.set_top(&ratings, self.options.top_authors);
        }
        self.changed();
    }

    pub fn add_topics(&self, topics: Vec<Topic>) {
        if self.topics.write().add(topics) > 0 {
            self.changed();
        }
    }

    pub fn add_reactions(&self, reactions: Vec<Reaction>) {
        if self.reactions.write().add(reactions) > 0 {
            self.changed();
        }
    }

    pub fn reset_sorted_shouts(&self) {
        self.shouts.write().reset_sorted();
        self.changed();
    }

    pub fn set_authors_sort_by(&self, sort_by: AuthorsSortBy) {
        self.authors.write().set_sort_by(sort_by);
        self.changed();
    }

    pub fn set_topics_sort_by(&self, sort_by: TopicsSortBy) {
        self.topics.write().set_sort_by(sort_by);
        self.changed();
    }

    /// Recomputes the top lists from `shouts` (`now` in unix seconds).
    pub fn set_tops(&self, shouts: &[Shout], now: i64) {
        *self.tops.write() = top::compute_tops(shouts, now);
        self.changed();
    }

    /// Picks up to `amount` random topics from the ones already known.
    pub fn pick_random_topics(&self, amount: usize) -> Vec<Topic> {
        self.topics
            .read()
            .pick_random(&mut rand::thread_rng(), amount)
    }

    // shout loaders

    pub async fn load_shouts(
        &self,
        options: &LoadShoutsOptions,
        cancel: &CancellationToken,
    ) -> Result<Page<Shout>, Error> {
        let ticket = self.requests.begin(feed_key("shouts", options)?);
        let request = LoadShoutsOptions {
            limit: request_limit(options.limit),
            ..options.clone()
        };
        let fetched = until_cancelled(cancel, self.api.get_shouts(&request)).await?;
        self.requests.check(&ticket)?;
        Ok(self.merge_feed_page(fetched, options.limit))
    }

    pub async fn load_my_feed(
        &self,
        options: &LoadShoutsOptions,
        cancel: &CancellationToken,
    ) -> Result<Page<Shout>, Error> {
        let ticket = self.requests.begin(feed_key("my_feed", options)?);
        let request = LoadShoutsOptions {
            limit: request_limit(options.limit),
            ..options.clone()
        };
        let fetched = until_cancelled(cancel, self.api.get_my_feed(&request)).await?;
        self.requests.check(&ticket)?;
        Ok(self.merge_feed_page(fetched, options.limit))
    }

    pub async fn load_shouts_search(
        &self,
        options: &SearchOptions,
        cancel: &CancellationToken,
    ) -> Result<Page<Shout>, Error> {
        let ticket = self.requests.begin(request_key("search", &options.text)?);
        let request = SearchOptions {
            limit: request_limit(options.limit),
            ..options.clone()
        };
        let fetched = until_cancelled(cancel, self.api.get_shouts_search(&request)).await?;
        self.requests.check(&ticket)?;
        Ok(self.merge_feed_page(fetched, options.limit))
    }

    pub async fn load_layout_shouts(
        &self,
        layout: Layout,
        limit: u32,
        offset: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Shout>, Error> {
        let options = LoadShoutsOptions::new(limit)
            .with_filters(ShoutsFilters {
                layouts: Some(vec![layout]),
                ..Default::default()
            })
            .with_offset(offset);
        self.load_shouts(&options, cancel).await
    }

    fn merge_feed_page(&self, fetched: Vec<Shout>, limit: u32) -> Page<Shout> {
        let page = split_page(fetched, limit);
        debug!("Loaded {} shouts, more: {}", page.len(), page.has_more);
        self.add_shouts(page.items.clone());
        self.shouts.write().append_sorted(&page.items);
        self.changed();
        page
    }

    /// Loads one shout. When it is already in the feed list the list sees
    /// the fresh copy in place.
    pub async fn load_shout(
        &self,
        slug: &ShoutSlug,
        cancel: &CancellationToken,
    ) -> Result<Shout, Error> {
        let ticket = self.requests.begin(request_key("shout", slug)?);
        let shout = until_cancelled(cancel, self.api.get_shout(slug))
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "shout",
                slug: slug.to_string(),
            })?;
        self.requests.check(&ticket)?;
        self.add_shouts(vec![shout.clone()]);
        Ok(shout)
    }

    pub async fn load_top_articles(&self, cancel: &CancellationToken) -> Result<Vec<Shout>, Error> {
        let options = LoadShoutsOptions::new(self.options.top_count)
            .with_filters(ShoutsFilters {
                featured: Some(true),
                ..Default::default()
            })
            .ordered_by("likes_stat");
        let ticket = self.requests.begin("top".to_string());
        let shouts = until_cancelled(cancel, self.api.get_shouts(&options)).await?;
        self.requests.check(&ticket)?;
        self.add_shouts(shouts.clone());
        self.shouts.write().set_top(&shouts);
        self.changed();
        Ok(shouts)
    }

    pub async fn load_top_month_articles(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Shout>, Error> {
        let after = Utc::now() - Duration::days(self.options.top_month_days);
        let options = LoadShoutsOptions::new(self.options.top_count)
            .with_filters(ShoutsFilters {
                featured: Some(true),
                after: Some(after.timestamp()),
                ..Default::default()
            })
            .ordered_by("likes_stat");
        let ticket = self.requests.begin("top_month".to_string());
        let shouts = until_cancelled(cancel, self.api.get_shouts(&options)).await?;
        self.requests.check(&ticket)?;
        self.add_shouts(shouts.clone());
        self.shouts.write().set_top_month(&shouts);
        self.changed();
        Ok(shouts)
    }

    // author loaders

    pub async fn load_author(
        &self,
        slug: &AuthorSlug,
        cancel: &CancellationToken,
    ) -> Result<Author, Error> {
        let ticket = self.requests.begin(request_key("author", slug)?);
        let author = until_cancelled(cancel, self.api.get_author(slug))
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "author",
                slug: slug.to_string(),
            })?;
        self.requests.check(&ticket)?;
        self.add_authors(vec![author.clone()]);
        Ok(author)
    }

    pub async fn load_all_authors(&self, cancel: &CancellationToken) -> Result<Vec<Author>, Error> {
        let ticket = self.requests.begin("all_authors".to_string());
        let authors = until_cancelled(cancel, self.api.get_all_authors()).await?;
        self.requests.check(&ticket)?;
        debug!("Loaded {} authors", authors.len());
        self.add_authors(authors.clone());
        Ok(authors)
    }

    pub async fn load_authors_by(
        &self,
        by: &AuthorsBy,
        limit: u32,
        offset: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Author>, Error> {
        let ticket = self.requests.begin(request_key("authors", by)?);
        let fetched = until_cancelled(
            cancel,
            self.api.load_authors_by(by, request_limit(limit), offset),
        )
        .await?;
        self.requests.check(&ticket)?;
        let page = split_page(fetched, limit);
        self.add_authors(page.items.clone());
        Ok(page)
    }

    // topic loaders

    pub async fn load_all_topics(&self, cancel: &CancellationToken) -> Result<Vec<Topic>, Error> {
        let ticket = self.requests.begin("all_topics".to_string());
        let topics = until_cancelled(cancel, self.api.get_all_topics()).await?;
        self.requests.check(&ticket)?;
        debug!("Loaded {} topics", topics.len());
        self.add_topics(topics.clone());
        Ok(topics)
    }

    pub async fn load_random_topics(
        &self,
        amount: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Topic>, Error> {
        let ticket = self.requests.begin("random_topics".to_string());
        let topics = until_cancelled(cancel, self.api.get_random_topics(amount)).await?;
        self.requests.check(&ticket)?;
        self.topics.write().set_random(topics.clone());
        self.changed();
        Ok(topics)
    }

    pub async fn load_topic(
        &self,
        slug: &TopicSlug,
        cancel: &CancellationToken,
    ) -> Result<Topic, Error> {
        let ticket = self.requests.begin(request_key("topic", slug)?);
        let topic = until_cancelled(cancel, self.api.get_topic(slug))
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "topic",
                slug: slug.to_string(),
            })?;
        self.requests.check(&ticket)?;
        self.add_topics(vec![topic.clone()]);
        Ok(topic)
    }

    // reactions

    pub async fn load_reactions_by(
        &self,
        by: &ReactionsBy,
        limit: u32,
        offset: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Reaction>, Error> {
        let ticket = self.requests.begin(request_key("reactions", by)?);
        let fetched = until_cancelled(
            cancel,
            self.api.load_reactions_by(by, request_limit(limit), offset),
        )
        .await?;
        self.requests.check(&ticket)?;
        let page = split_page(fetched, limit);
        trace!("Loaded {} reactions", page.len());
        self.add_reactions(page.items.clone());
        Ok(page)
    }

    /// Loads a page of a shout's reactions using the configured page size.
    pub async fn load_shout_reactions(
        &self,
        slug: &ShoutSlug,
        offset: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<Reaction>, Error> {
        let by = ReactionsBy::shout(slug.clone());
        self.load_reactions_by(&by, self.options.reactions_per_page, offset, cancel)
            .await
    }

    pub async fn create_reaction(&self, input: &ReactionInput) -> Result<Reaction, Error> {
        let reaction = self.api.create_reaction(input).await?;
        self.reactions.write().apply_created(reaction.clone());
        self.changed();
        Ok(reaction)
    }

    pub async fn update_reaction(&self, input: &ReactionInput) -> Result<Reaction, Error> {
        let reaction = self.api.update_reaction(input).await?;
        self.add_reactions(vec![reaction.clone()]);
        Ok(reaction)
    }

    pub async fn delete_reaction(&self, id: ReactionId) -> Result<(), Error> {
        self.api.delete_reaction(id).await?;
        if self.reactions.write().remove(id).is_some() {
            self.changed();
        }
        Ok(())
    }

    // shout views

    pub fn shout(&self, slug: &ShoutSlug) -> Option<Shout> {
        self.shouts.read().get(slug).cloned()
    }

    pub fn shouts_count(&self) -> usize {
        self.shouts.read().len()
    }

    pub fn sorted_shouts(&self) -> Vec<Shout> {
        self.shouts.read().sorted()
    }

    pub fn shouts_by_author(&self, slug: &AuthorSlug) -> Vec<Shout> {
        self.shouts.read().by_author(slug)
    }

    pub fn shouts_by_topic(&self, slug: &TopicSlug) -> Vec<Shout> {
        self.shouts.read().by_topic(slug)
    }

    pub fn shouts_by_layout(&self, layout: &Layout) -> Vec<Shout> {
        self.shouts.read().by_layout(layout)
    }

    pub fn top_viewed_shouts(&self) -> Vec<Shout> {
        self.shouts.read().top_viewed()
    }

    pub fn top_commented_shouts(&self) -> Vec<Shout> {
        self.shouts.read().top_commented()
    }

    pub fn top_shouts_by(&self, metric: Metric, limit: usize) -> Vec<Shout> {
        self.shouts.read().top_by_metric(metric, limit)
    }

    pub fn top_articles(&self) -> Vec<Shout> {
        self.shouts.read().top()
    }

    pub fn top_month_articles(&self) -> Vec<Shout> {
        self.shouts.read().top_month()
    }

    pub fn tops(&self) -> Tops {
        self.tops.read().clone()
    }

    // author views

    pub fn author(&self, slug: &AuthorSlug) -> Option<Author> {
        self.authors.read().get(slug).cloned()
    }

    pub fn sorted_authors(&self) -> Vec<Author> {
        self.authors.read().sorted()
    }

    pub fn authors_by_topic(&self, slug: &TopicSlug) -> Vec<Author> {
        self.authors.read().by_topic(slug)
    }

    pub fn top_authors(&self) -> Vec<Author> {
        self.authors.read().top()
    }

    pub fn authors_grouped_by_name(&self) -> BTreeMap<String, Vec<Author>> {
        self.authors.read().grouped()
    }

    // topic views

    pub fn topic(&self, slug: &TopicSlug) -> Option<Topic> {
        self.topics.read().get(slug).cloned()
    }

    pub fn sorted_topics(&self) -> Vec<Topic> {
        self.topics.read().sorted()
    }

    pub fn top_topics(&self, limit: usize) -> Vec<Topic> {
        self.topics.read().top(limit)
    }

    pub fn random_topics(&self) -> Vec<Topic> {
        self.topics.read().random()
    }

    pub fn topics_by_author(&self, slug: &AuthorSlug) -> Vec<Topic> {
        self.topics.read().by_author(slug)
    }

    pub fn topics_grouped_by_title(&self) -> BTreeMap<String, Vec<Topic>> {
        self.topics.read().grouped()
    }

    // reaction views

    pub fn reaction(&self, id: ReactionId) -> Option<Reaction> {
        self.reactions.read().get(id).cloned()
    }

    pub fn sorted_reactions(&self) -> Vec<Reaction> {
        self.reactions.read().sorted()
    }

    pub fn reactions_by_shout(&self, slug: &ShoutSlug) -> Vec<Reaction> {
        self.reactions.read().by_shout(slug)
    }

    pub fn reactions_by_author(&self, author_id: i64) -> Vec<Reaction> {
        self.reactions.read().by_author(author_id)
    }

    pub fn comments_by_author(&self, author_id: i64) -> Vec<Reaction> {
        self.reactions.read().comments_by_author(author_id)
    }

    pub fn comment_thread(&self, slug: &ShoutSlug) -> Vec<ReactionNode> {
        self.reactions.read().thread(slug)
    }
}

/// Feed loads with the same filters and order share a key whatever the page.
fn feed_key(kind: &str, options: &LoadShoutsOptions) -> Result<String, Error> {
    request_key(
        kind,
        &(&options.filters, &options.order_by, &options.order_desc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;
    use zine_msg::{FollowingEntity, ReactionKind, Subscriptions};

    use crate::{reactions::tests::reaction, shouts::tests::shout};

    #[derive(Default)]
    struct MockApi {
        shouts: Mutex<Vec<Shout>>,
        authors: Mutex<Vec<Author>>,
        reactions: Mutex<Vec<Reaction>>,
        gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
        requests: Mutex<Vec<LoadShoutsOptions>>,
        fail: Mutex<Option<ApiError>>,
    }

    impl MockApi {
        fn page<T: Clone>(items: &[T], limit: u32, offset: u32) -> Vec<T> {
            items
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect()
        }

        fn failure(&self) -> Result<(), ApiError> {
            match self.fail.lock().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl CoreApi for MockApi {
        async fn get_shouts(&self, options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError> {
            self.requests.lock().push(options.clone());
            let gate = self.gates.lock().pop_front();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.failure()?;
            Ok(Self::page(&self.shouts.lock(), options.limit, options.offset))
        }

        async fn get_my_feed(&self, options: &LoadShoutsOptions) -> Result<Vec<Shout>, ApiError> {
            self.get_shouts(options).await
        }

        async fn get_shouts_search(&self, options: &SearchOptions) -> Result<Vec<Shout>, ApiError> {
            let shouts = self.shouts.lock();
            let found: Vec<Shout> = shouts
                .iter()
                .filter(|shout| shout.title.contains(&options.text))
                .cloned()
                .collect();
            Ok(Self::page(&found, options.limit, options.offset))
        }

        async fn get_shout(&self, slug: &ShoutSlug) -> Result<Option<Shout>, ApiError> {
            let shouts = self.shouts.lock();
            Ok(shouts.iter().find(|shout| &shout.slug == slug).cloned())
        }

        async fn get_author(&self, slug: &AuthorSlug) -> Result<Option<Author>, ApiError> {
            let authors = self.authors.lock();
            Ok(authors.iter().find(|author| &author.slug == slug).cloned())
        }

        async fn get_all_authors(&self) -> Result<Vec<Author>, ApiError> {
            Ok(self.authors.lock().clone())
        }

        async fn load_authors_by(
            &self,
            _by: &AuthorsBy,
            limit: u32,
            offset: u32,
        ) -> Result<Vec<Author>, ApiError> {
            Ok(Self::page(&self.authors.lock(), limit, offset))
        }

        async fn get_all_topics(&self) -> Result<Vec<Topic>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_random_topics(&self, _amount: u32) -> Result<Vec<Topic>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_topic(&self, _slug: &TopicSlug) -> Result<Option<Topic>, ApiError> {
            Ok(None)
        }

        async fn load_reactions_by(
            &self,
            _by: &ReactionsBy,
            limit: u32,
            offset: u32,
        ) -> Result<Vec<Reaction>, ApiError> {
            Ok(Self::page(&self.reactions.lock(), limit, offset))
        }

        async fn create_reaction(&self, input: &ReactionInput) -> Result<Reaction, ApiError> {
            let kind = serde_json::to_value(input.kind)
                .ok()
                .and_then(|kind| kind.as_str().map(str::to_string))
                .unwrap_or_default();
            Ok(reaction(100, &kind, (1, "anna"), "foo", None, 50))
        }

        async fn update_reaction(&self, _input: &ReactionInput) -> Result<Reaction, ApiError> {
            Err(ApiError::new("not supported"))
        }

        async fn delete_reaction(&self, _id: ReactionId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn follow(&self, _what: FollowingEntity, _slug: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn unfollow(&self, _what: FollowingEntity, _slug: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn get_my_subscriptions(&self) -> Result<Subscriptions, ApiError> {
            Ok(Subscriptions::default())
        }
    }

    fn shouts(count: usize) -> Vec<Shout> {
        (0..count)
            .map(|i| shout(&format!("shout-{}", i), &["anna"], &["art"], json!({})))
            .collect()
    }

    fn slugs(shouts: &[Shout]) -> Vec<String> {
        shouts.iter().map(|shout| shout.slug.to_string()).collect()
    }

    #[tokio::test]
    async fn pages_over_fetch_by_one() {
        let api = Arc::new(MockApi::default());
        *api.shouts.lock() = shouts(15);
        let zine = Zine::new(api.clone());
        let cancel = CancellationToken::new();

        let first = zine
            .load_shouts(&LoadShoutsOptions::new(10), &cancel)
            .await
            .unwrap();
        assert_eq!(first.len(), 10);
        assert!(first.has_more);
        assert_eq!(api.requests.lock()[0].limit, 11);

        let second = zine
            .load_shouts(&LoadShoutsOptions::new(10).with_offset(10), &cancel)
            .await
            .unwrap();
        assert_eq!(second.len(), 5);
        assert!(!second.has_more);

        assert_eq!(zine.sorted_shouts().len(), 15);
        assert_eq!(zine.shouts_count(), 15);
        let anna = AuthorSlug::try_from("anna").unwrap();
        assert!(zine.author(&anna).is_some());
        assert_eq!(zine.topics_by_author(&anna).len(), 1);
    }

    #[tokio::test]
    async fn exactly_full_page_has_no_more() {
        let api = Arc::new(MockApi::default());
        *api.shouts.lock() = shouts(10);
        let zine = Zine::new(api);
        let page = zine
            .load_shouts(&LoadShoutsOptions::new(10), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.len(), 10);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let api = Arc::new(MockApi::default());
        *api.shouts.lock() = shouts(3);
        let (release, gate) = oneshot::channel();
        api.gates.lock().push_back(gate);
        let zine = Arc::new(Zine::new(api.clone()));

        let first = tokio::spawn({
            let zine = zine.clone();
            async move {
                zine.load_shouts(&LoadShoutsOptions::new(2), &CancellationToken::new())
                    .await
            }
        });
        // park the first request on its gate
        while api.requests.lock().is_empty() {
            tokio::task::yield_now().await;
        }
        let second = zine
            .load_shouts(&LoadShoutsOptions::new(2), &CancellationToken::new())
            .await;
        let _ = release.send(());
        let first = first.await.unwrap();

        assert!(matches!(first, Err(Error::Superseded(_))));
        assert_eq!(second.unwrap().len(), 2);
        // only the winning response reached the feed list
        assert_eq!(zine.sorted_shouts().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_load_is_not_merged() {
        let api = Arc::new(MockApi::default());
        *api.shouts.lock() = shouts(3);
        let (release, gate) = oneshot::channel();
        api.gates.lock().push_back(gate);
        let zine = Zine::new(api);
        let cancel = CancellationToken::new();

        let opts = LoadShoutsOptions::new(10);
        let load = zine.load_shouts(&opts, &cancel);
        let cancel_then_release = async {
            cancel.cancel();
            let _ = release.send(());
        };
        let (result, _) = tokio::join!(load, cancel_then_release);

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(zine.shouts_count(), 0);
        assert_eq!(zine.revision(), 0);
    }

    #[tokio::test]
    async fn api_errors_surface_once() {
        let api = Arc::new(MockApi::default());
        *api.fail.lock() = Some(ApiError::new("offline"));
        let zine = Zine::new(api.clone());
        let result = zine
            .load_shouts(&LoadShoutsOptions::new(10), &CancellationToken::new())
            .await;
        assert_eq!(
            result.unwrap_err().api_error(),
            Some(&ApiError::new("offline"))
        );
        assert_eq!(api.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn missing_shout_is_not_found() {
        let api = Arc::new(MockApi::default());
        *api.shouts.lock() = shouts(2);
        let zine = Zine::new(api.clone());
        let cancel = CancellationToken::new();
        zine.load_shouts(&LoadShoutsOptions::new(10), &cancel)
            .await
            .unwrap();

        let missing = ShoutSlug::try_from("missing").unwrap();
        let result = zine.load_shout(&missing, &cancel).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "shout", .. })));

        api.shouts.lock()[1].title = "Edited".to_string();
        let slug = ShoutSlug::try_from("shout-1").unwrap();
        zine.load_shout(&slug, &cancel).await.unwrap();
        let sorted = zine.sorted_shouts();
        assert_eq!(slugs(&sorted), vec!["shout-0", "shout-1"]);
        assert_eq!(sorted[1].title, "Edited");
    }

    #[tokio::test]
    async fn like_replaces_dislike_through_the_api() {
        let api = Arc::new(MockApi::default());
        *api.reactions.lock() = vec![reaction(7, "DISLIKE", (1, "anna"), "foo", None, 10)];
        let zine = Zine::new(api);
        let foo = ShoutSlug::try_from("foo").unwrap();
        let cancel = CancellationToken::new();
        let page = zine.load_shout_reactions(&foo, 0, &cancel).await.unwrap();
        assert_eq!(page.len(), 1);

        let input = ReactionInput {
            id: None,
            kind: ReactionKind::Like,
            shout: 1,
            body: None,
            reply_to: None,
            quote: None,
        };
        zine.create_reaction(&input).await.unwrap();
        let kinds: Vec<ReactionKind> = zine
            .reactions_by_shout(&foo)
            .iter()
            .map(|reaction| reaction.kind)
            .collect();
        assert_eq!(kinds, vec![ReactionKind::Like]);

        zine.delete_reaction(ReactionId(100)).await.unwrap();
        assert!(zine.reactions_by_shout(&foo).is_empty());
    }

    #[tokio::test]
    async fn revisions_are_observable() {
        let api = Arc::new(MockApi::default());
        let zine = Zine::new(api);
        let mut revisions = zine.subscribe();
        zine.add_authors(Vec::new());
        assert!(!revisions.has_changed().unwrap());

        let anna: Author = serde_json::from_value(json!({ "id": 1, "slug": "anna" })).unwrap();
        zine.add_authors(vec![anna]);
        assert!(revisions.has_changed().unwrap());
        assert_eq!(*revisions.borrow_and_update(), 1);
    }
}
