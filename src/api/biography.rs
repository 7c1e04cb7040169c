//! Biography endpoints.

use axum::{Json, extract::State};

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::content::biography::{Biography, BiographyInput};
use crate::error::{EncoreError, Result};
use crate::validation::ValidatedJson;

/// GET /api/biography
pub async fn get_biography(State(state): State<AppState>) -> Result<Json<Biography>> {
    state
        .biography
        .get_biography()
        .await?
        .map(Json)
        .ok_or_else(|| EncoreError::not_found("biography"))
}

/// PUT /api/admin/biography: replace the whole document.
pub async fn put_biography(
    _admin: AdminUser,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<BiographyInput>,
) -> Result<Json<Biography>> {
    let biography = state.biography.put_biography(input).await?;
    Ok(Json(biography))
}
