//! Concert endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::content::concerts::{Concert, ConcertInput};
use crate::error::{EncoreError, Result};
use crate::http::{PageQuery, PaginatedData};
use crate::validation::ValidatedJson;

/// GET /api/concerts
pub async fn list_concerts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedData<Concert>>> {
    let page = page.clamped();
    let (concerts, total) = state.concerts.list_concerts(&page).await?;
    Ok(Json(PaginatedData::new(concerts, total, &page)))
}

/// GET /api/concerts/{id}
pub async fn get_concert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Concert>> {
    state
        .concerts
        .get_concert(&id)
        .await?
        .map(Json)
        .ok_or_else(|| EncoreError::not_found(format!("concert {id}")))
}

/// POST /api/admin/concerts
pub async fn create_concert(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ConcertInput>,
) -> Result<(StatusCode, Json<Concert>)> {
    let concert = Concert::new(input);
    state.concerts.insert_concert(&concert).await?;
    Ok((StatusCode::CREATED, Json(concert)))
}

/// PUT /api/admin/concerts/{id}: full-replace.
pub async fn update_concert(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<ConcertInput>,
) -> Result<Json<Concert>> {
    let concert = state.concerts.update_concert(&id, &input).await?;
    Ok(Json(concert))
}

/// DELETE /api/admin/concerts/{id}
pub async fn delete_concert(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.concerts.delete_concert(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
