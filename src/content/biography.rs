//! The artist biography: a single document, replaced wholesale by admins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct Biography {
    pub headline: String,
    pub body: String,
    pub portrait_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BiographyInput {
    #[validate(length(min = 1, message = "headline is required"))]
    pub headline: String,
    #[validate(length(min = 1, message = "body is required"))]
    pub body: String,
    #[serde(default)]
    pub portrait_url: Option<String>,
}

impl Biography {
    #[must_use]
    pub fn from_input(input: BiographyInput) -> Self {
        Self {
            headline: input.headline,
            body: input.body,
            portrait_url: input.portrait_url,
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait BiographyStore: Send + Sync {
    /// The current biography, if one has been written.
    async fn get_biography(&self) -> Result<Option<Biography>>;

    /// Replace the biography.
    async fn put_biography(&self, input: BiographyInput) -> Result<Biography>;
}
