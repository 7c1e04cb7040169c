//! The HTTP surface: route table and handlers, one module per resource.

pub mod auth;
pub mod billing;
pub mod biography;
pub mod blog;
pub mod concerts;
pub mod contacts;
pub mod discography;
pub mod members;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::app::AppState;

/// Request-id source for the tracing stack.
#[derive(Clone, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = uuid::Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/posts", get(blog::list_posts))
        .route("/api/posts/{id}", get(blog::get_post))
        .route("/api/concerts", get(concerts::list_concerts))
        .route("/api/concerts/{id}", get(concerts::get_concert))
        .route("/api/releases", get(discography::list_releases))
        .route("/api/releases/{id}", get(discography::get_release))
        .route("/api/biography", get(biography::get_biography))
        .route("/api/contacts", post(contacts::submit_contact))
        .route("/api/auth/callback", get(auth::oauth_callback));

    let member = Router::new()
        .route(
            "/api/members/me",
            get(members::get_profile)
                .put(members::update_profile)
                .delete(members::delete_account),
        )
        .route("/api/members/dashboard", get(members::dashboard));

    let billing = Router::new()
        .route("/api/billing/checkout", post(billing::create_checkout))
        .route("/api/billing/portal", post(billing::create_portal))
        .route("/api/billing/webhook", post(billing::webhook));

    let admin = Router::new()
        .route(
            "/api/admin/posts",
            get(blog::admin_list_posts).post(blog::create_post),
        )
        .route(
            "/api/admin/posts/{id}",
            put(blog::update_post).delete(blog::delete_post),
        )
        .route("/api/admin/posts/{id}/autosave", put(blog::autosave_post))
        .route("/api/admin/posts/{id}/publish", post(blog::publish_post))
        .route("/api/admin/concerts", post(concerts::create_concert))
        .route(
            "/api/admin/concerts/{id}",
            put(concerts::update_concert).delete(concerts::delete_concert),
        )
        .route("/api/admin/releases", post(discography::create_release))
        .route(
            "/api/admin/releases/{id}",
            put(discography::update_release).delete(discography::delete_release),
        )
        .route("/api/admin/biography", put(biography::put_biography))
        .route("/api/admin/contacts", get(contacts::admin_list_contacts))
        .route("/api/admin/contacts/{id}", get(contacts::admin_get_contact))
        .route(
            "/api/admin/contacts/{id}/status",
            put(contacts::admin_set_status),
        )
        .route("/api/admin/members", get(members::admin_list_members))
        .route(
            "/api/admin/billing/dead-letters",
            get(billing::admin_list_dead_letters),
        );

    let max_body = state.config.server.max_body_size;
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .merge(public)
        .merge(member)
        .merge(billing)
        .merge(admin)
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({"status": "ok"}))
}
