//! Billing: gold-tier checkout, customer portal, and the webhook-driven
//! subscription lifecycle.
//!
//! The user's role is a cached projection of their subscription status,
//! recomputed on every verified webhook event and never taken from client
//! input. All lifecycle writes are unconditional overwrites keyed by the
//! stable Stripe subscription/customer ids, which keeps webhook replays
//! harmless.

pub mod checkout;
pub mod client;
pub mod customer;
pub mod live_client;
pub mod portal;
pub mod storage;
pub mod subscription;
pub mod webhook;

pub use checkout::{CheckoutConfig, CheckoutManager};
pub use client::{
    CheckoutSession, CreateCheckoutSessionRequest, CreateCustomerRequest,
    CreatePortalSessionRequest, MockStripeClient, PortalSession, StripeClient,
};
pub use customer::CustomerManager;
pub use live_client::LiveStripeClient;
pub use portal::PortalManager;
pub use storage::{BillingStore, DeadLetter};
pub use subscription::{
    MembershipSummary, MembershipTier, SubscriptionRecord, SubscriptionStatus, projected_role,
};
pub use webhook::{WebhookEvent, WebhookHandler, WebhookOutcome};
