//! Discography: released records and where to stream them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::http::PageQuery;

#[derive(Debug, Clone, Serialize)]
pub struct Release {
    pub id: String,
    pub title: String,
    pub released_on: NaiveDate,
    pub cover_url: Option<String>,
    pub tracklist: Vec<String>,
    pub streaming_links: Vec<StreamingLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingLink {
    pub platform: String,
    pub url: String,
}

/// Editable fields; admin updates are full-replace.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReleaseInput {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub released_on: NaiveDate,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub tracklist: Vec<String>,
    #[serde(default)]
    pub streaming_links: Vec<StreamingLink>,
}

impl Release {
    #[must_use]
    pub fn new(input: ReleaseInput) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title,
            released_on: input.released_on,
            cover_url: input.cover_url,
            tracklist: input.tracklist,
            streaming_links: input.streaming_links,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
pub trait ReleaseStore: Send + Sync {
    async fn insert_release(&self, release: &Release) -> Result<()>;

    async fn get_release(&self, id: &str) -> Result<Option<Release>>;

    /// Full-replace. Errors with `NotFound` if missing.
    async fn update_release(&self, id: &str, input: &ReleaseInput) -> Result<Release>;

    /// Hard delete. Errors with `NotFound` if missing.
    async fn delete_release(&self, id: &str) -> Result<()>;

    /// All releases, newest first.
    async fn list_releases(&self, page: &PageQuery) -> Result<(Vec<Release>, u64)>;
}
