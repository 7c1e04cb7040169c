//! Blog endpoints: public gated reads plus the admin editing surface.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{AdminUser, Viewer};
use crate::content::blog::{BlogPost, BlogPostDraft, BlogPostSummary, BlogPostView};
use crate::error::{EncoreError, Result};
use crate::http::{PageQuery, PaginatedData};
use crate::roles::Role;
use crate::validation::ValidatedJson;

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    /// Category filter; "news" is the news feed.
    category: Option<String>,
}

/// GET /api/posts: published posts only, gated summaries.
pub async fn list_posts(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PaginatedData<BlogPostSummary>>> {
    let page = PageQuery::from_parts(query.page, query.per_page);
    let (posts, total) = state
        .posts
        .list_visible(Utc::now(), query.category.as_deref(), &page)
        .await?;

    let items = posts
        .iter()
        .map(|post| BlogPostSummary::project(post, viewer))
        .collect();

    Ok(Json(PaginatedData::new(items, total, &page)))
}

/// GET /api/posts/{id}: gated detail.
///
/// Unpublished posts are a plain 404 to everyone but admins, so their
/// existence is not leaked.
pub async fn get_post(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
) -> Result<Json<BlogPostView>> {
    let post = state
        .posts
        .get_post(&id)
        .await?
        .ok_or_else(|| EncoreError::not_found(format!("post {id}")))?;

    if !post.is_publicly_visible(Utc::now()) && viewer != Some(Role::Admin) {
        return Err(EncoreError::not_found(format!("post {id}")));
    }

    Ok(Json(BlogPostView::project(&post, viewer)))
}

/// GET /api/admin/posts: full records, drafts included.
pub async fn admin_list_posts(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedData<BlogPost>>> {
    let page = page.clamped();
    let (posts, total) = state.posts.list_all_posts(&page).await?;
    Ok(Json(PaginatedData::new(posts, total, &page)))
}

/// POST /api/admin/posts: create a draft.
pub async fn create_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidatedJson(draft): ValidatedJson<BlogPostDraft>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let post = BlogPost::new_draft(draft);
    state.posts.insert_post(&post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/admin/posts/{id}: full-replace of the draft fields.
pub async fn update_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(draft): ValidatedJson<BlogPostDraft>,
) -> Result<Json<BlogPost>> {
    let post = state.posts.update_post(&id, &draft).await?;
    Ok(Json(post))
}

/// PUT /api/admin/posts/{id}/autosave: queue a debounced draft write.
///
/// Autosaved drafts are allowed to be rough (no validation); the explicit
/// save and publish paths are where the rules apply.
pub async fn autosave_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<BlogPostDraft>,
) -> Result<StatusCode> {
    if state.posts.get_post(&id).await?.is_none() {
        return Err(EncoreError::not_found(format!("post {id}")));
    }
    state.autosaver.queue(&id, draft);
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishBody {
    /// Publish time; a future value schedules the post. Defaults to now.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// POST /api/admin/posts/{id}/publish: cancel any pending autosave, fold
/// its draft in, and mark the post published immediately.
pub async fn publish_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PublishBody>,
) -> Result<Json<BlogPost>> {
    let before = state
        .posts
        .get_post(&id)
        .await?
        .ok_or_else(|| EncoreError::not_found(format!("post {id}")))?;

    if let Some(pending) = state.autosaver.cancel(&id) {
        state.posts.update_post(&id, &pending).await?;
    }

    let published_at = body.published_at.unwrap_or_else(Utc::now);
    let post = state.posts.set_published(&id, published_at).await?;

    if !before.published {
        state.notifier.post_published(&post);
    }

    Ok(Json(post))
}

/// DELETE /api/admin/posts/{id}: hard delete.
pub async fn delete_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.autosaver.cancel(&id);
    state.posts.delete_post(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
