//! Storage trait for billing state.
//!
//! Covers the cached subscription rows, webhook idempotency bookkeeping,
//! and the dead-letter log for writes that failed after a verified event
//! was accepted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use super::subscription::SubscriptionRecord;

/// A verified webhook event whose local write could not be applied.
///
/// The event was acknowledged to the provider (bouncing it would only feed
/// the retry storm), so this record is the operator's handle for
/// reconciling the drift.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetter {
    pub id: String,
    pub event_id: String,
    pub event_type: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl DeadLetter {
    #[must_use]
    pub fn new(event_id: &str, event_type: &str, reason: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}

/// Store for billing state.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// The subscription row for a user (at most one).
    async fn subscription_for_user(&self, user_id: &str) -> Result<Option<SubscriptionRecord>>;

    /// Unconditional overwrite keyed by `user_id`.
    async fn upsert_subscription(&self, record: &SubscriptionRecord) -> Result<()>;

    /// Look up a row by its Stripe subscription id (webhook path).
    async fn subscription_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>>;

    /// Drop a user's subscription row (account-deletion cascade).
    async fn delete_subscription_for_user(&self, user_id: &str) -> Result<()>;

    // Webhook idempotency

    async fn is_event_processed(&self, event_id: &str) -> Result<bool>;

    async fn mark_event_processed(&self, event_id: &str) -> Result<()>;

    // Dead letters

    async fn record_dead_letter(&self, entry: &DeadLetter) -> Result<()>;

    /// All recorded dead letters, newest first (admin reconciliation view).
    async fn list_dead_letters(&self) -> Result<Vec<DeadLetter>>;
}
