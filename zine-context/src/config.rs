use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use zine_store::ZineOptions;

use crate::Error;

/// Client settings, read from a toml file. Every field has a default.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub shouts_per_page: u32,
    pub reactions_per_page: u32,
    pub notifications_page_size: u32,
    pub top_count: u32,
    pub top_month_days: i64,
    pub top_authors: usize,
    pub session_recheck_secs: u64,
    pub reconnect_times: u32,
    pub topics_cache_max_age_ms: i64,
    pub database_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            shouts_per_page: 20,
            reactions_per_page: 100,
            notifications_page_size: 20,
            top_count: 10,
            top_month_days: 30,
            top_authors: 5,
            session_recheck_secs: 60,
            reconnect_times: 2,
            topics_cache_max_age_ms: 24 * 60 * 60 * 1000,
            database_path: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path).map_err(Error::ReadConfig)?;
        Self::from_toml_str(&content)
    }

    pub fn session_recheck(&self) -> Duration {
        Duration::from_secs(self.session_recheck_secs)
    }

    pub fn zine_options(&self) -> ZineOptions {
        ZineOptions {
            reactions_per_page: self.reactions_per_page,
            top_count: self.top_count,
            top_month_days: self.top_month_days,
            top_authors: self.top_authors,
        }
    }
}
