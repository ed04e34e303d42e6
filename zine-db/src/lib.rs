use log::{info, trace};
use sqlx::{Connection, SqliteConnection};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use zine_msg::{Draft, Topic};
use zine_ref::ShoutSlug;

pub mod sql;
pub use sql::SeenEntry;
use sql::*;

/// Client state that outlives a session: auth token, seen shouts, drafts,
/// notification cursor and the all-topics cache.
pub struct Database {
    sql: SqliteConnection,
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Json error, cause: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Sql error, cause: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Stored value for {key} is malformed: {value}")]
    BadValue { key: &'static str, value: String },
}

impl Database {
    pub async fn new(sql_path: &str) -> Result<Self, Error> {
        let mut sql = create_connection(sql_path).await?;

        if let Ok(false) = is_db_up_to_date(&mut sql).await {
            info!("sqlite db is out of date. Dropping tables and they will be rebuilt.");
            setup_new_db(&mut sql).await?;
        }
        setup_db(&mut sql).await?;

        Ok(Self { sql })
    }

    pub async fn check_integrity(&mut self) -> Result<bool, Error> {
        Ok(check_db_integrity(&mut self.sql).await?)
    }

    pub async fn close(self) -> Result<(), Error> {
        Ok(self.sql.close().await?)
    }

    // token

    pub async fn get_token(&mut self) -> Result<Option<String>, Error> {
        Ok(select_kv(&mut self.sql, TOKEN_KEY).await?)
    }

    pub async fn set_token(&mut self, token: &str) -> Result<(), Error> {
        trace!("Storing auth token");
        Ok(insert_or_update_kv(&mut self.sql, TOKEN_KEY, token).await?)
    }

    pub async fn reset_token(&mut self) -> Result<(), Error> {
        trace!("Resetting auth token");
        Ok(delete_kv(&mut self.sql, TOKEN_KEY).await?)
    }

    // notifier cursor

    pub async fn get_notifier_timestamp(&mut self) -> Result<Option<i64>, Error> {
        let value = select_kv(&mut self.sql, NOTIFIER_TIMESTAMP_KEY).await?;
        match value {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| Error::BadValue {
                key: NOTIFIER_TIMESTAMP_KEY,
                value,
            }),
        }
    }

    pub async fn set_notifier_timestamp(&mut self, timestamp: i64) -> Result<(), Error> {
        let value = timestamp.to_string();
        Ok(insert_or_update_kv(&mut self.sql, NOTIFIER_TIMESTAMP_KEY, &value).await?)
    }

    // seen

    /// Records that `slug` was seen at `seen_at`. An older timestamp never overwrites a newer one.
    pub async fn add_seen(&mut self, slug: &ShoutSlug, seen_at: i64) -> Result<(), Error> {
        Ok(insert_or_update_seen(&mut self.sql, slug.as_str(), seen_at).await?)
    }

    pub async fn get_seen_at(&mut self, slug: &ShoutSlug) -> Result<Option<i64>, Error> {
        Ok(select_seen_at(&mut self.sql, slug.as_str()).await?)
    }

    pub async fn get_seen(&mut self) -> Result<HashMap<String, i64>, Error> {
        let entries = select_all_seen(&mut self.sql).await?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.slug, entry.seen_at))
            .collect())
    }

    pub async fn get_seen_entries(&mut self) -> Result<Vec<SeenEntry>, Error> {
        Ok(select_all_seen(&mut self.sql).await?)
    }

    // drafts

    /// Stores a draft under its local id, assigning one when absent.
    pub async fn save_draft(&mut self, draft: &Draft) -> Result<Draft, Error> {
        let content = serde_json::to_string(draft)?;
        let id = insert_or_replace_draft(&mut self.sql, draft.id, draft.updated_at, &content).await?;

        let mut saved = draft.clone();
        saved.id = Some(id);
        if draft.id != Some(id) {
            // keep the stored json in line with the assigned id
            let content = serde_json::to_string(&saved)?;
            insert_or_replace_draft(&mut self.sql, Some(id), saved.updated_at, &content).await?;
        }
        Ok(saved)
    }

    pub async fn get_drafts(&mut self) -> Result<Vec<Draft>, Error> {
        let rows = select_all_drafts(&mut self.sql).await?;
        let mut drafts = Vec::with_capacity(rows.len());
        for (id, content) in rows {
            let mut draft: Draft = serde_json::from_str(&content)?;
            draft.id = Some(id);
            drafts.push(draft);
        }
        Ok(drafts)
    }

    pub async fn remove_draft(&mut self, id: i64) -> Result<bool, Error> {
        Ok(delete_draft(&mut self.sql, id).await?)
    }

    // topics cache

    /// Cached topics, if they were stored less than `max_age_ms` before `now`.
    pub async fn get_cached_topics(
        &mut self,
        now: i64,
        max_age_ms: i64,
    ) -> Result<Option<Vec<Topic>>, Error> {
        let row = select_topics_cache(&mut self.sql).await?;
        match row {
            Some((fetched_at, content)) if now - fetched_at < max_age_ms => {
                Ok(Some(serde_json::from_str(&content)?))
            }
            _ => Ok(None),
        }
    }

    pub async fn set_cached_topics(&mut self, topics: &[Topic], now: i64) -> Result<(), Error> {
        trace!("Caching {} topics", topics.len());
        let content = serde_json::to_string(topics)?;
        Ok(replace_topics_cache(&mut self.sql, now, &content).await?)
    }
}
