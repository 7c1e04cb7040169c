//! Stripe webhook handling: signature verification, event routing, and the
//! role projection.
//!
//! Verification runs over the raw request body bytes before any parsing.
//! After a signed event is accepted, local write failures are recorded as
//! dead letters and the event is still acknowledged; bouncing a
//! permanently unresolvable event back at the provider would only trigger
//! its retry storm.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{EncoreError, Result};
use crate::roles::Role;
use crate::store::{UserRecord, UserStore};
use super::storage::{BillingStore, DeadLetter};
use super::subscription::{
    MembershipTier, SubscriptionRecord, SubscriptionStatus, projected_role,
};

/// Maximum accepted clock skew between the signature timestamp and now.
const SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

/// Handles inbound billing webhook events.
pub struct WebhookHandler {
    users: Arc<dyn UserStore>,
    store: Arc<dyn BillingStore>,
    webhook_secret: SecretString,
}

/// A parsed webhook event.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
    pub created: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

/// Outcome of processing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    /// Event type this system does not react to; still acknowledged.
    Ignored,
    /// Replay of an already-processed event.
    AlreadyProcessed,
    /// Verified event whose local write failed; recorded for
    /// reconciliation and acknowledged.
    DeadLettered,
}

impl WebhookHandler {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        store: Arc<dyn BillingStore>,
        webhook_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            users,
            store,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify the `Stripe-Signature` header against the raw body and parse
    /// the event.
    pub fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent> {
        let parts = parse_signature_header(signature)?;

        let now = Utc::now().timestamp();
        if (now - parts.timestamp).abs() > SIGNATURE_TOLERANCE_SECONDS {
            return Err(EncoreError::signature_invalid("webhook timestamp too old"));
        }

        let signed_payload = format!("{}.{}", parts.timestamp, String::from_utf8_lossy(payload));
        let expected = compute_signature(
            self.webhook_secret.expose_secret(),
            signed_payload.as_bytes(),
        )?;

        let expected_bytes = hex::decode(&expected)
            .map_err(|_| EncoreError::internal("signature hex encoding failed"))?;
        let provided_bytes = hex::decode(&parts.signature)
            .map_err(|_| EncoreError::signature_invalid("malformed signature value"))?;

        if expected_bytes.ct_eq(&provided_bytes).unwrap_u8() != 1 {
            return Err(EncoreError::signature_invalid("signature mismatch"));
        }

        serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "webhook payload failed to parse after verification");
            EncoreError::validation("malformed webhook payload")
        })
    }

    /// Route a verified event. Replays are detected by event id and
    /// acknowledged without reapplying.
    pub async fn handle_event(&self, event: WebhookEvent) -> Result<WebhookOutcome> {
        if self.store.is_event_processed(&event.id).await? {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let outcome = match event.event_type.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(&event).await?,
            "customer.subscription.created" | "customer.subscription.updated" => {
                self.handle_subscription_updated(&event).await?
            }
            "customer.subscription.deleted" => self.handle_subscription_deleted(&event).await?,
            _ => WebhookOutcome::Ignored,
        };

        if !matches!(outcome, WebhookOutcome::Ignored) {
            self.store.mark_event_processed(&event.id).await?;
        }

        Ok(outcome)
    }

    /// A completed checkout with a subscription attached makes the user a
    /// gold member immediately; the follow-up subscription events keep the
    /// row fresh afterwards.
    async fn handle_checkout_completed(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let object = &event.data.object;

        let Some(subscription_id) = object.get("subscription").and_then(|v| v.as_str()) else {
            // One-time payment checkouts carry no subscription.
            return Ok(WebhookOutcome::Ignored);
        };

        let customer_id = object
            .get("customer")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let Some(user) = self.resolve_user(object, customer_id, None).await? else {
            return self
                .dead_letter(event, format!("no user for customer {customer_id}"))
                .await;
        };

        let record = SubscriptionRecord {
            user_id: user.id.clone(),
            tier: MembershipTier::Gold,
            status: SubscriptionStatus::Active,
            current_period_end: parse_timestamp(object.get("current_period_end")),
            cancel_at_period_end: false,
            stripe_customer_id: customer_id.to_string(),
            stripe_subscription_id: subscription_id.to_string(),
            updated_at: Utc::now(),
        };
        self.store.upsert_subscription(&record).await?;
        self.apply_role(&user, Role::MemberGold).await?;

        Ok(WebhookOutcome::Processed)
    }

    /// Sync the row from a subscription update and recompute the role:
    /// active/trialing keeps gold, anything else downgrades to free
    /// immediately.
    async fn handle_subscription_updated(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let object = &event.data.object;

        let Some(subscription_id) = object.get("id").and_then(|v| v.as_str()) else {
            return self.dead_letter(event, "missing subscription id").await;
        };
        let customer_id = object
            .get("customer")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let status = SubscriptionStatus::from_stripe(
            object.get("status").and_then(|v| v.as_str()).unwrap_or(""),
        );

        let existing = self
            .store
            .subscription_by_stripe_id(subscription_id)
            .await?;
        let known_user_id = existing.as_ref().map(|sub| sub.user_id.as_str());

        let Some(user) = self
            .resolve_user(object, customer_id, known_user_id)
            .await?
        else {
            return self
                .dead_letter(
                    event,
                    format!("no user for subscription {subscription_id}"),
                )
                .await;
        };

        let record = SubscriptionRecord {
            user_id: user.id.clone(),
            tier: MembershipTier::Gold,
            status,
            current_period_end: parse_timestamp(object.get("current_period_end")),
            cancel_at_period_end: object
                .get("cancel_at_period_end")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            stripe_customer_id: customer_id.to_string(),
            stripe_subscription_id: subscription_id.to_string(),
            updated_at: Utc::now(),
        };
        self.store.upsert_subscription(&record).await?;
        self.apply_role(&user, projected_role(status)).await?;

        Ok(WebhookOutcome::Processed)
    }

    /// Deletion marks the row canceled (never removes it) and downgrades
    /// the role to free. Replays and deletions for unknown subscriptions
    /// are harmless no-ops.
    async fn handle_subscription_deleted(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let object = &event.data.object;

        let Some(subscription_id) = object.get("id").and_then(|v| v.as_str()) else {
            return self.dead_letter(event, "missing subscription id").await;
        };

        let Some(existing) = self
            .store
            .subscription_by_stripe_id(subscription_id)
            .await?
        else {
            return Ok(WebhookOutcome::Processed);
        };

        let record = SubscriptionRecord {
            status: SubscriptionStatus::Canceled,
            cancel_at_period_end: false,
            updated_at: Utc::now(),
            ..existing
        };
        self.store.upsert_subscription(&record).await?;

        match self.users.get_user(&record.user_id).await? {
            Some(user) => {
                self.apply_role(&user, Role::MemberFree).await?;
                Ok(WebhookOutcome::Processed)
            }
            None => {
                self.dead_letter(
                    event,
                    format!("subscription {subscription_id} belongs to deleted user"),
                )
                .await
            }
        }
    }

    /// Resolve the local user for an event object: explicit metadata first,
    /// then the user already linked to the subscription row, then the
    /// billing customer id.
    async fn resolve_user(
        &self,
        object: &serde_json::Value,
        customer_id: &str,
        known_user_id: Option<&str>,
    ) -> Result<Option<UserRecord>> {
        let metadata_user_id = object
            .get("metadata")
            .and_then(|m| m.get("user_id"))
            .and_then(|v| v.as_str());

        if let Some(user_id) = metadata_user_id {
            if let Some(user) = self.users.get_user(user_id).await? {
                return Ok(Some(user));
            }
        }

        if let Some(user_id) = known_user_id {
            if let Some(user) = self.users.get_user(user_id).await? {
                return Ok(Some(user));
            }
        }

        if !customer_id.is_empty() {
            return self.users.find_by_customer_id(customer_id).await;
        }

        Ok(None)
    }

    /// Write the projected role, leaving admins untouched.
    async fn apply_role(&self, user: &UserRecord, role: Role) -> Result<()> {
        if user.role == Role::Admin {
            return Ok(());
        }
        self.users.set_role(&user.id, role).await
    }

    async fn dead_letter(
        &self,
        event: &WebhookEvent,
        reason: impl Into<String>,
    ) -> Result<WebhookOutcome> {
        let reason = reason.into();
        tracing::error!(
            event_id = %event.id,
            event_type = %event.event_type,
            reason = %reason,
            "webhook write failed after verification; recording dead letter"
        );
        self.store
            .record_dead_letter(&DeadLetter::new(&event.id, &event.event_type, reason))
            .await?;
        Ok(WebhookOutcome::DeadLettered)
    }
}

fn parse_timestamp(value: Option<&serde_json::Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.as_i64())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

struct SignatureParts {
    timestamp: i64,
    signature: String,
}

/// Parse the `t=...,v1=...` signature header.
fn parse_signature_header(header: &str) -> Result<SignatureParts> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(EncoreError::signature_invalid(
                "malformed signature header",
            ));
        };
        match key.trim() {
            "t" => timestamp = value.parse().ok(),
            "v1" => signature = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(SignatureParts {
        timestamp: timestamp
            .ok_or_else(|| EncoreError::signature_invalid("missing timestamp"))?,
        signature: signature
            .ok_or_else(|| EncoreError::signature_invalid("missing v1 signature"))?,
    })
}

/// HMAC-SHA256 over the signed payload, hex encoded.
fn compute_signature(secret: &str, payload: &[u8]) -> Result<String> {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| EncoreError::internal("HMAC key setup failed"))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, OAuthIdentity};

    const SECRET: &str = "whsec_test_secret";

    fn handler(store: Arc<InMemoryStore>) -> WebhookHandler {
        WebhookHandler::new(store.clone(), store, SECRET.to_string())
    }

    async fn seeded_user(store: &InMemoryStore) -> UserRecord {
        let user = store
            .upsert_oauth(&OAuthIdentity {
                provider: "google".to_string(),
                subject: "sub-1".to_string(),
                email: "fan@example.com".to_string(),
                name: "Fan".to_string(),
                picture: None,
            })
            .await
            .unwrap();
        store
            .set_stripe_customer_id(&user.id, "cus_1")
            .await
            .unwrap();
        store.get_user(&user.id).await.unwrap().unwrap()
    }

    fn checkout_completed(event_id: &str, user_id: &str) -> WebhookEvent {
        WebhookEvent {
            id: event_id.to_string(),
            event_type: "checkout.session.completed".to_string(),
            data: WebhookEventData {
                object: serde_json::json!({
                    "subscription": "sub_abc",
                    "customer": "cus_1",
                    "metadata": {"user_id": user_id},
                }),
            },
            created: 1_700_000_000,
        }
    }

    fn subscription_updated(event_id: &str, status: &str) -> WebhookEvent {
        WebhookEvent {
            id: event_id.to_string(),
            event_type: "customer.subscription.updated".to_string(),
            data: WebhookEventData {
                object: serde_json::json!({
                    "id": "sub_abc",
                    "customer": "cus_1",
                    "status": status,
                    "current_period_end": 1_702_592_000,
                    "cancel_at_period_end": false,
                }),
            },
            created: 1_700_000_000,
        }
    }

    fn subscription_deleted(event_id: &str) -> WebhookEvent {
        WebhookEvent {
            id: event_id.to_string(),
            event_type: "customer.subscription.deleted".to_string(),
            data: WebhookEventData {
                object: serde_json::json!({"id": "sub_abc"}),
            },
            created: 1_700_000_000,
        }
    }

    fn sign(payload: &[u8], timestamp: i64) -> String {
        let signed = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let sig = compute_signature(SECRET, signed.as_bytes()).unwrap();
        format!("t={timestamp},v1={sig}")
    }

    // ---- signature verification ----

    #[test]
    fn accepts_a_valid_signature() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store);

        let payload =
            br#"{"id":"evt_1","type":"x","data":{"object":{}},"created":1700000000}"#;
        let signature = sign(payload, Utc::now().timestamp());
        assert!(handler.verify_signature(payload, &signature).is_ok());
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store);

        let payload =
            br#"{"id":"evt_1","type":"x","data":{"object":{}},"created":1700000000}"#;
        let signature = sign(payload, Utc::now().timestamp());
        let tampered =
            br#"{"id":"evt_2","type":"x","data":{"object":{}},"created":1700000000}"#;
        let result = handler.verify_signature(tampered, &signature);
        assert!(matches!(result, Err(EncoreError::SignatureInvalid(_))));
    }

    #[test]
    fn rejects_a_stale_timestamp() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store);

        let payload =
            br#"{"id":"evt_1","type":"x","data":{"object":{}},"created":1700000000}"#;
        let signature = sign(payload, Utc::now().timestamp() - 3600);
        let result = handler.verify_signature(payload, &signature);
        assert!(matches!(result, Err(EncoreError::SignatureInvalid(_))));
    }

    #[test]
    fn rejects_a_garbled_header() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store);
        let result = handler.verify_signature(b"{}", "not-a-signature-header");
        assert!(result.is_err());
    }

    // ---- lifecycle ----

    #[tokio::test]
    async fn checkout_completed_makes_the_user_gold() {
        let store = Arc::new(InMemoryStore::new());
        let user = seeded_user(&store).await;
        let handler = handler(store.clone());

        let outcome = handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Processed);

        let refreshed = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.role, Role::MemberGold);

        let sub = store.subscription_for_user(&user.id).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.stripe_subscription_id, "sub_abc");
    }

    #[tokio::test]
    async fn checkout_replay_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let user = seeded_user(&store).await;
        let handler = handler(store.clone());

        handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        let after_first = store.subscription_for_user(&user.id).await.unwrap().unwrap();
        let role_first = store.get_user(&user.id).await.unwrap().unwrap().role;

        let outcome = handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);

        let after_second = store.subscription_for_user(&user.id).await.unwrap().unwrap();
        assert_eq!(after_first.updated_at, after_second.updated_at);
        assert_eq!(role_first, store.get_user(&user.id).await.unwrap().unwrap().role);
    }

    #[tokio::test]
    async fn checkout_without_subscription_is_ignored() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store);

        let event = WebhookEvent {
            id: "evt_onetime".to_string(),
            event_type: "checkout.session.completed".to_string(),
            data: WebhookEventData {
                object: serde_json::json!({"customer": "cus_1"}),
            },
            created: 1_700_000_000,
        };
        let outcome = handler.handle_event(event).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn past_due_downgrades_to_free_immediately() {
        let store = Arc::new(InMemoryStore::new());
        let user = seeded_user(&store).await;
        let handler = handler(store.clone());

        handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        assert_eq!(
            store.get_user(&user.id).await.unwrap().unwrap().role,
            Role::MemberGold
        );

        let outcome = handler
            .handle_event(subscription_updated("evt_2", "past_due"))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Processed);

        let refreshed = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.role, Role::MemberFree);
        let sub = store.subscription_for_user(&user.id).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn active_update_restores_gold() {
        let store = Arc::new(InMemoryStore::new());
        let user = seeded_user(&store).await;
        let handler = handler(store.clone());

        handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        handler
            .handle_event(subscription_updated("evt_2", "past_due"))
            .await
            .unwrap();
        handler
            .handle_event(subscription_updated("evt_3", "active"))
            .await
            .unwrap();

        let refreshed = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.role, Role::MemberGold);
    }

    #[tokio::test]
    async fn deletion_cancels_and_downgrades() {
        let store = Arc::new(InMemoryStore::new());
        let user = seeded_user(&store).await;
        let handler = handler(store.clone());

        handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        let outcome = handler
            .handle_event(subscription_deleted("evt_2"))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Processed);

        let refreshed = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.role, Role::MemberFree);

        // The row is canceled, not deleted.
        let sub = store.subscription_for_user(&user.id).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert!(!sub.cancel_at_period_end);
    }

    #[tokio::test]
    async fn deletion_replay_after_downgrade_is_harmless() {
        let store = Arc::new(InMemoryStore::new());
        let user = seeded_user(&store).await;
        let handler = handler(store.clone());

        handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        handler
            .handle_event(subscription_deleted("evt_2"))
            .await
            .unwrap();

        // Same event id again: replay.
        let outcome = handler
            .handle_event(subscription_deleted("evt_2"))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);

        // A second deletion under a fresh id is also harmless.
        let outcome = handler
            .handle_event(subscription_deleted("evt_3"))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(
            store.get_user(&user.id).await.unwrap().unwrap().role,
            Role::MemberFree
        );
    }

    #[tokio::test]
    async fn unknown_event_types_are_ignored() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store);

        let event = WebhookEvent {
            id: "evt_x".to_string(),
            event_type: "invoice.finalized".to_string(),
            data: WebhookEventData {
                object: serde_json::json!({}),
            },
            created: 1_700_000_000,
        };
        let outcome = handler.handle_event(event).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn unresolvable_customer_is_dead_lettered_and_acked() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(store.clone());

        let event = WebhookEvent {
            id: "evt_orphan".to_string(),
            event_type: "checkout.session.completed".to_string(),
            data: WebhookEventData {
                object: serde_json::json!({
                    "subscription": "sub_zzz",
                    "customer": "cus_unknown",
                }),
            },
            created: 1_700_000_000,
        };
        let outcome = handler.handle_event(event).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::DeadLettered);

        let letters = store.list_dead_letters().await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].event_id, "evt_orphan");
    }

    #[tokio::test]
    async fn admin_role_survives_webhook_traffic() {
        let store = Arc::new(InMemoryStore::new());
        let user = seeded_user(&store).await;
        store.set_role(&user.id, Role::Admin).await.unwrap();
        let handler = handler(store.clone());

        handler
            .handle_event(checkout_completed("evt_1", &user.id))
            .await
            .unwrap();
        handler
            .handle_event(subscription_updated("evt_2", "past_due"))
            .await
            .unwrap();

        assert_eq!(
            store.get_user(&user.id).await.unwrap().unwrap().role,
            Role::Admin
        );
    }
}
