//! OAuth callback: code exchange, user upsert, token issuance, redirect.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::{EncoreError, Result};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Set by the provider when the user denied the request.
    pub error: Option<String>,
}

/// GET /api/auth/callback
///
/// Exchanges the authorization code, upserts the local account, issues a
/// session token and sends the browser back to the frontend with the token
/// in the URL fragment (fragments never reach server logs).
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    let frontend = state.config.oauth.frontend_url.trim_end_matches('/');

    if let Some(error) = query.error {
        tracing::warn!(%error, "identity provider returned an error");
        return Ok(Redirect::temporary(&format!(
            "{frontend}/auth/callback#error={}",
            urlencoding::encode(&error)
        )));
    }

    let code = query
        .code
        .ok_or_else(|| EncoreError::validation("missing authorization code"))?;

    let identity = state.identity.exchange_code(&code).await?;
    let user = state.users.upsert_oauth(&identity).await?;
    let issued = state.issuer.issue(&user)?;

    Ok(Redirect::temporary(&format!(
        "{frontend}/auth/callback#token={}&expires_in={}",
        issued.token, issued.expires_in
    )))
}
