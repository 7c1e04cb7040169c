//! Concert listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use crate::error::Result;
use crate::http::PageQuery;

#[derive(Debug, Clone, Serialize)]
pub struct Concert {
    pub id: String,
    pub title: String,
    pub venue: String,
    pub city: String,
    pub starts_at: DateTime<Utc>,
    pub ticket_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields; admin updates are full-replace.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct ConcertInput {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "venue is required"))]
    pub venue: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    #[validate(url(message = "ticket_url must be a valid URL"))]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Concert {
    #[must_use]
    pub fn new(input: ConcertInput) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title,
            venue: input.venue,
            city: input.city,
            starts_at: input.starts_at,
            ticket_url: input.ticket_url,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
pub trait ConcertStore: Send + Sync {
    async fn insert_concert(&self, concert: &Concert) -> Result<()>;

    async fn get_concert(&self, id: &str) -> Result<Option<Concert>>;

    /// Full-replace. Errors with `NotFound` if missing.
    async fn update_concert(&self, id: &str, input: &ConcertInput) -> Result<Concert>;

    /// Hard delete. Errors with `NotFound` if missing.
    async fn delete_concert(&self, id: &str) -> Result<()>;

    /// All concerts, soonest first.
    async fn list_concerts(&self, page: &PageQuery) -> Result<(Vec<Concert>, u64)>;
}
