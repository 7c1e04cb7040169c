//! Billing endpoints: checkout, portal, and the webhook receiver.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::{AdminUser, AuthUser};
use crate::billing::DeadLetter;
use crate::error::{EncoreError, Result};

#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub url: String,
    pub session_id: String,
}

/// POST /api/billing/checkout: open a gold checkout session.
pub async fn create_checkout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RedirectResponse>> {
    let session = state.checkout.create_gold_checkout(&user).await?;
    Ok(Json(RedirectResponse {
        url: session.url,
        session_id: session.id,
    }))
}

/// POST /api/billing/portal: open a customer-portal session.
pub async fn create_portal(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RedirectResponse>> {
    let session = state.portal.create_portal_session(&user).await?;
    Ok(Json(RedirectResponse {
        url: session.url,
        session_id: session.id,
    }))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/billing/webhook: Stripe event intake.
///
/// The body is taken as raw bytes: signature verification must run over
/// exactly what was sent, never a re-serialized parse. A bad signature is
/// the only rejection; verified events are always acknowledged, with
/// unresolvable ones landing in the dead-letter log.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| EncoreError::signature_invalid("missing stripe-signature header"))?;

    let event = state.webhooks.verify_signature(&body, signature)?;
    let outcome = state.webhooks.handle_event(event).await?;
    tracing::debug!(?outcome, "webhook handled");

    Ok(Json(WebhookAck { received: true }))
}

/// GET /api/admin/billing/dead-letters: reconciliation view.
pub async fn admin_list_dead_letters(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DeadLetter>>> {
    Ok(Json(state.billing.list_dead_letters().await?))
}
