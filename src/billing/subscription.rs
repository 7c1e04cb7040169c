//! Subscription state and the role projection derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Subscription status, synced from Stripe via webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
}

impl SubscriptionStatus {
    /// Parse a Stripe status string. Unknown values map to `Canceled` so an
    /// unrecognized status can never grant access.
    #[must_use]
    pub fn from_stripe(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "unpaid" => Self::Unpaid,
            _ => Self::Canceled,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Unpaid => "unpaid",
        }
    }

    /// Active and trialing subscriptions are the paying states.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Membership tier. Only `Gold` is paid; `Free` appears in summaries for
/// users with no (or no longer active) paid history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Free,
    Gold,
}

/// The cached subscription row, 1:1 with a user.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub tier: MembershipTier,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub updated_at: DateTime<Utc>,
}

/// The role a subscription status projects onto its owner.
///
/// Any non-active status downgrades to `MEMBER_FREE` immediately; the
/// system does not wait for the deletion event, and a lapsed member never
/// reverts all the way to `USER` automatically. Admins are exempted by the
/// caller before this projection is applied.
#[must_use]
pub fn projected_role(status: SubscriptionStatus) -> Role {
    if status.is_active() {
        Role::MemberGold
    } else {
        Role::MemberFree
    }
}

/// Membership state surfaced on the member dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipSummary {
    pub tier: MembershipTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl MembershipSummary {
    #[must_use]
    pub fn from_subscription(subscription: Option<&SubscriptionRecord>) -> Self {
        match subscription {
            Some(sub) if sub.status.is_active() => Self {
                tier: MembershipTier::Gold,
                status: Some(sub.status),
                current_period_end: sub.current_period_end,
                cancel_at_period_end: sub.cancel_at_period_end,
            },
            Some(sub) => Self {
                tier: MembershipTier::Free,
                status: Some(sub.status),
                current_period_end: sub.current_period_end,
                cancel_at_period_end: sub.cancel_at_period_end,
            },
            None => Self {
                tier: MembershipTier::Free,
                status: None,
                current_period_end: None,
                cancel_at_period_end: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripe_status_parsing_is_fail_closed() {
        assert_eq!(
            SubscriptionStatus::from_stripe("active"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_stripe("past_due"),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            SubscriptionStatus::from_stripe("incomplete_expired"),
            SubscriptionStatus::IncompleteExpired
        );
        // Unknown statuses must never read as paying.
        assert_eq!(
            SubscriptionStatus::from_stripe("paused"),
            SubscriptionStatus::Canceled
        );
        assert_eq!(
            SubscriptionStatus::from_stripe(""),
            SubscriptionStatus::Canceled
        );
    }

    #[test]
    fn projection_maps_active_states_to_gold() {
        assert_eq!(
            projected_role(SubscriptionStatus::Active),
            Role::MemberGold
        );
        assert_eq!(
            projected_role(SubscriptionStatus::Trialing),
            Role::MemberGold
        );
    }

    #[test]
    fn projection_downgrades_every_other_state_to_free() {
        for status in [
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Incomplete,
            SubscriptionStatus::IncompleteExpired,
            SubscriptionStatus::Unpaid,
        ] {
            assert_eq!(projected_role(status), Role::MemberFree, "{status}");
        }
    }

    #[test]
    fn summary_without_history_is_plain_free() {
        let summary = MembershipSummary::from_subscription(None);
        assert_eq!(summary.tier, MembershipTier::Free);
        assert!(summary.status.is_none());
    }

    #[test]
    fn summary_reflects_lapsed_subscription() {
        let sub = SubscriptionRecord {
            user_id: "u1".to_string(),
            tier: MembershipTier::Gold,
            status: SubscriptionStatus::PastDue,
            current_period_end: None,
            cancel_at_period_end: false,
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: "sub_1".to_string(),
            updated_at: Utc::now(),
        };
        let summary = MembershipSummary::from_subscription(Some(&sub));
        assert_eq!(summary.tier, MembershipTier::Free);
        assert_eq!(summary.status, Some(SubscriptionStatus::PastDue));
    }
}
