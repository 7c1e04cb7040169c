//! Discography endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::content::discography::{Release, ReleaseInput};
use crate::error::{EncoreError, Result};
use crate::http::{PageQuery, PaginatedData};
use crate::validation::ValidatedJson;

/// GET /api/releases
pub async fn list_releases(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedData<Release>>> {
    let page = page.clamped();
    let (releases, total) = state.releases.list_releases(&page).await?;
    Ok(Json(PaginatedData::new(releases, total, &page)))
}

/// GET /api/releases/{id}
pub async fn get_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Release>> {
    state
        .releases
        .get_release(&id)
        .await?
        .map(Json)
        .ok_or_else(|| EncoreError::not_found(format!("release {id}")))
}

/// POST /api/admin/releases
pub async fn create_release(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ReleaseInput>,
) -> Result<(StatusCode, Json<Release>)> {
    let release = Release::new(input);
    state.releases.insert_release(&release).await?;
    Ok((StatusCode::CREATED, Json(release)))
}

/// PUT /api/admin/releases/{id}: full-replace.
pub async fn update_release(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<ReleaseInput>,
) -> Result<Json<Release>> {
    let release = state.releases.update_release(&id, &input).await?;
    Ok(Json(release))
}

/// DELETE /api/admin/releases/{id}
pub async fn delete_release(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.releases.delete_release(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
