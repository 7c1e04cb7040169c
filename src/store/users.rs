//! User records and the user store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::http::PageQuery;
use crate::roles::Role;

/// A local account, created on first OAuth sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    pub role: Role,
    /// Identity provider that authenticated this user (e.g. "google").
    pub provider: String,
    /// Provider-side subject identifier.
    pub provider_subject: String,
    /// Billing customer id, set on first checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity facts delivered by the OAuth callback, used to upsert a user.
#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    pub provider: String,
    pub subject: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Self-service profile changes; everything else on the record is
/// controlled by the system or an admin.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// Store for user accounts.
///
/// `delete` cascades to the user's subscription row; role writes come only
/// from admin action or the billing webhook.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert on first sign-in, otherwise refresh name/picture. Matched by
    /// provider subject first, then by email (an existing account gets its
    /// provider linkage updated rather than duplicated).
    async fn upsert_oauth(&self, identity: &OAuthIdentity) -> Result<UserRecord>;

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Resolve a user from their billing customer id (webhook path).
    async fn find_by_customer_id(&self, customer_id: &str) -> Result<Option<UserRecord>>;

    /// Overwrite the role. Errors with `NotFound` if the user is gone.
    async fn set_role(&self, user_id: &str, role: Role) -> Result<()>;

    /// Record the billing customer id created for this user.
    async fn set_stripe_customer_id(&self, user_id: &str, customer_id: &str) -> Result<()>;

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRecord>;

    /// Remove the account and its subscription row.
    async fn delete_user(&self, user_id: &str) -> Result<()>;

    /// Page through member-tier accounts (free and gold), newest first.
    async fn list_members(&self, page: &PageQuery) -> Result<(Vec<UserRecord>, u64)>;
}

impl UserRecord {
    /// Build a fresh record from an OAuth identity. New accounts start as
    /// plain users; membership is a separate, explicit step.
    #[must_use]
    pub fn from_identity(identity: &OAuthIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            image_url: identity.picture.clone(),
            role: Role::User,
            provider: identity.provider.clone(),
            provider_subject: identity.subject.clone(),
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
