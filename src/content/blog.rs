//! Blog posts: drafts, publishing, and gated wire projections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use crate::access::{self, ContentAccess};
use crate::error::Result;
use crate::http::PageQuery;
use crate::roles::Role;

/// A blog post as stored.
#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub thumbnail_url: Option<String>,
    /// Free-form category; "news" items are posts in the "news" category.
    pub category: Option<String>,
    pub members_only: bool,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Create a fresh draft from editable fields.
    #[must_use]
    pub fn new_draft(draft: BlogPostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            content: draft.content,
            excerpt: draft.excerpt,
            thumbnail_url: draft.thumbnail_url,
            category: draft.category,
            members_only: draft.members_only,
            published: false,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether anonymous/public readers may see this post at all.
    ///
    /// A scheduled post (future `published_at`) stays invisible until the
    /// timestamp passes.
    #[must_use]
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        self.published && self.published_at.is_some_and(|at| at <= now)
    }
}

/// The editable fields of a post; admin updates are full-replace over
/// exactly this set. Publish state is changed through the publish action,
/// never through a draft write.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct BlogPostDraft {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub members_only: bool,
}

/// List-item projection: metadata for everyone, plus the lock marker so the
/// frontend can render a teaser state.
#[derive(Debug, Serialize)]
pub struct BlogPostSummary {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub members_only: bool,
    pub is_locked: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl BlogPostSummary {
    #[must_use]
    pub fn project(post: &BlogPost, viewer: Option<Role>) -> Self {
        let access = access::gate_content(viewer, post.members_only);
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            thumbnail_url: post.thumbnail_url.clone(),
            category: post.category.clone(),
            members_only: post.members_only,
            is_locked: access.is_locked(),
            published_at: post.published_at,
        }
    }
}

/// Detail projection: the body is withheld (null) for viewers who do not
/// satisfy the member gate. Never a 403; the teaser degrades gracefully.
#[derive(Debug, Serialize)]
pub struct BlogPostView {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub excerpt: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub members_only: bool,
    pub is_locked: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl BlogPostView {
    #[must_use]
    pub fn project(post: &BlogPost, viewer: Option<Role>) -> Self {
        let access = access::gate_content(viewer, post.members_only);
        let content = match access {
            ContentAccess::Full => Some(post.content.clone()),
            ContentAccess::Locked => None,
        };
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            content,
            excerpt: post.excerpt.clone(),
            thumbnail_url: post.thumbnail_url.clone(),
            category: post.category.clone(),
            members_only: post.members_only,
            is_locked: access.is_locked(),
            published_at: post.published_at,
        }
    }
}

/// Store for blog posts.
#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn insert_post(&self, post: &BlogPost) -> Result<()>;

    async fn get_post(&self, id: &str) -> Result<Option<BlogPost>>;

    /// Full-replace of the draft fields. Errors with `NotFound` if missing.
    async fn update_post(&self, id: &str, draft: &BlogPostDraft) -> Result<BlogPost>;

    /// Mark published with the given timestamp (future values schedule the
    /// post). Errors with `NotFound` if missing.
    async fn set_published(&self, id: &str, published_at: DateTime<Utc>) -> Result<BlogPost>;

    /// Hard delete. Errors with `NotFound` if missing.
    async fn delete_post(&self, id: &str) -> Result<()>;

    /// Publicly visible posts (published, past timestamp), newest first,
    /// optionally filtered by category.
    async fn list_visible(
        &self,
        now: DateTime<Utc>,
        category: Option<&str>,
        page: &PageQuery,
    ) -> Result<(Vec<BlogPost>, u64)>;

    /// Every post including drafts, newest first (admin listing).
    async fn list_all_posts(&self, page: &PageQuery) -> Result<(Vec<BlogPost>, u64)>;
}
