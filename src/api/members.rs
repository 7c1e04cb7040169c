//! Member self-service and the admin member listing.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::auth::{AdminUser, MemberUser};
use crate::billing::MembershipSummary;
use crate::content::blog::BlogPostSummary;
use crate::error::Result;
use crate::http::{PageQuery, PaginatedData};
use crate::store::{ProfileUpdate, UserRecord};
use crate::validation::ValidatedJson;

/// GET /api/members/me
pub async fn get_profile(MemberUser(user): MemberUser) -> Json<UserRecord> {
    Json(user)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileBody {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

/// PUT /api/members/me. Name and picture only; everything else on the
/// record belongs to the system.
pub async fn update_profile(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ProfileBody>,
) -> Result<Json<UserRecord>> {
    let updated = state
        .users
        .update_profile(
            &user.id,
            &ProfileUpdate {
                name: body.name,
                image_url: body.image_url,
            },
        )
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/members/me. Removes the account and its subscription row.
pub async fn delete_account(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.users.delete_user(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: UserRecord,
    pub membership: MembershipSummary,
    /// Latest members-only posts, already unlocked for this viewer.
    pub member_posts: Vec<BlogPostSummary>,
}

/// GET /api/members/dashboard
pub async fn dashboard(
    MemberUser(user): MemberUser,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>> {
    let subscription = state.billing.subscription_for_user(&user.id).await?;
    let membership = MembershipSummary::from_subscription(subscription.as_ref());

    let page = PageQuery {
        page: 1,
        per_page: 5,
    };
    let (posts, _) = state.posts.list_visible(Utc::now(), None, &page).await?;
    let member_posts = posts
        .iter()
        .filter(|p| p.members_only)
        .map(|p| BlogPostSummary::project(p, Some(user.role)))
        .collect();

    Ok(Json(Dashboard {
        user,
        membership,
        member_posts,
    }))
}

/// GET /api/admin/members: member-tier accounts, newest first.
pub async fn admin_list_members(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PaginatedData<UserRecord>>> {
    let page = page.clamped();
    let (members, total) = state.users.list_members(&page).await?;
    Ok(Json(PaginatedData::new(members, total, &page)))
}
