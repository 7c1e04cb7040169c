//! Contact endpoints: the rate-limited public form and the admin inbox.

use axum::{
    Json,
    extract::{FromRequestParts, Path, Query, State},
    http::StatusCode,
    http::request::Parts,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::AdminUser;
use crate::contacts::{Contact, ContactStatus, NewContact};
use crate::error::{EncoreError, Result};
use crate::http::{PageQuery, PaginatedData};
use crate::validation::ValidatedJson;

/// Best-effort client IP for rate limiting.
///
/// Proxy headers are only honored when `trust_proxy` is set; otherwise a
/// client could spoof X-Forwarded-For to dodge the limit.
pub struct ClientIp(pub Option<String>);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let from_proxy_headers = if state.config.contact_rate_limit.trust_proxy {
            parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                // "client, proxy1, proxy2": leftmost is the original client.
                .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
                .or_else(|| {
                    parts
                        .headers
                        .get("x-real-ip")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                })
        } else {
            None
        };

        let ip = from_proxy_headers.or_else(|| {
            parts
                .extensions
                .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        });

        Ok(ClientIp(ip))
    }
}

/// POST /api/contacts, the public submission endpoint.
///
/// Validation failures write no row and send no notification.
pub async fn submit_contact(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(input): ValidatedJson<NewContact>,
) -> Result<(StatusCode, Json<Contact>)> {
    if let Err(retry_after) = state.contact_limiter.check(ip.as_deref()) {
        return Err(EncoreError::too_many_requests(format!(
            "try again in {retry_after} seconds"
        )));
    }

    let contact = Contact::new(input);
    state.contacts.insert_contact(&contact).await?;
    state.notifier.contact_received(&contact);

    Ok((StatusCode::CREATED, Json(contact)))
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    /// Explicit status filter; without it the view shows everything except
    /// archived inquiries.
    status: Option<ContactStatus>,
}

/// GET /api/admin/contacts
pub async fn admin_list_contacts(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<PaginatedData<Contact>>> {
    let page = PageQuery::from_parts(query.page, query.per_page);
    let (contacts, total) = state.contacts.list_contacts(query.status, &page).await?;
    Ok(Json(PaginatedData::new(contacts, total, &page)))
}

/// GET /api/admin/contacts/{id}
///
/// First admin view of an unread inquiry marks it read automatically; this
/// is the only transition that does not come from an explicit status write.
pub async fn admin_get_contact(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    let contact = state
        .contacts
        .get_contact(&id)
        .await?
        .ok_or_else(|| EncoreError::not_found(format!("contact {id}")))?;

    let contact = if contact.status == ContactStatus::Unread {
        state
            .contacts
            .set_contact_status(&id, ContactStatus::Read)
            .await?
    } else {
        contact
    };

    Ok(Json(contact))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusBody {
    pub status: ContactStatus,
}

/// PUT /api/admin/contacts/{id}/status. Transitions are forward-only.
pub async fn admin_set_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<Contact>> {
    let contact = state
        .contacts
        .get_contact(&id)
        .await?
        .ok_or_else(|| EncoreError::not_found(format!("contact {id}")))?;

    if !contact.status.can_transition_to(body.status) {
        return Err(EncoreError::validation(format!(
            "cannot move contact from {} to {}",
            contact.status, body.status
        )));
    }

    let updated = state.contacts.set_contact_status(&id, body.status).await?;
    Ok(Json(updated))
}
