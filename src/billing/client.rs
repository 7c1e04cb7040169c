//! The Stripe client abstraction.
//!
//! One trait covers the three outbound operations this system performs:
//! creating a customer, opening a hosted checkout session, and opening a
//! customer-portal session. The live implementation talks to the Stripe
//! REST API; the mock is used in tests and when no API key is configured.

use async_trait::async_trait;

use crate::error::Result;

/// Request to create a billing customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub name: Option<String>,
    /// Local user id, attached as metadata so webhook processing can
    /// resolve the customer back to an account without extra lookups.
    pub user_id: String,
}

/// Request for a hosted checkout session (subscription mode, single price).
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionRequest {
    pub customer_id: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub trial_days: Option<u32>,
    /// Local user id, tagged onto both the session and the subscription it
    /// creates.
    pub user_id: String,
}

/// A hosted checkout session to redirect the browser to.
#[derive(Debug, Clone)]
#[must_use]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Request for a customer-portal session.
#[derive(Debug, Clone)]
pub struct CreatePortalSessionRequest {
    pub customer_id: String,
    pub return_url: String,
}

/// A portal session to redirect the browser to.
#[derive(Debug, Clone)]
#[must_use]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

/// Outbound Stripe operations.
#[async_trait]
pub trait StripeClient: Send + Sync {
    /// Create a customer, returning its Stripe id.
    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<String>;

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSession>;

    async fn create_portal_session(
        &self,
        request: CreatePortalSessionRequest,
    ) -> Result<PortalSession>;
}

/// In-memory Stripe client.
///
/// Backs tests, and the server itself when no API key is configured (local
/// development against the real checkout flow is impossible anyway).
#[derive(Default)]
pub struct MockStripeClient {
    counter: std::sync::atomic::AtomicU64,
    customers: std::sync::RwLock<Vec<CreateCustomerRequest>>,
}

impl MockStripeClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        self.counter
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }

    /// Customers created so far (for test assertions).
    pub fn created_customers(&self) -> Vec<CreateCustomerRequest> {
        self.customers.read().unwrap().clone()
    }
}

#[async_trait]
impl StripeClient for MockStripeClient {
    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<String> {
        let id = format!("cus_test_{}", self.next());
        self.customers.write().unwrap().push(request);
        Ok(id)
    }

    async fn create_checkout_session(
        &self,
        _request: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSession> {
        let id = format!("cs_test_{}", self.next());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{id}"),
            id,
        })
    }

    async fn create_portal_session(
        &self,
        _request: CreatePortalSessionRequest,
    ) -> Result<PortalSession> {
        let id = format!("bps_test_{}", self.next());
        Ok(PortalSession {
            url: format!("https://billing.stripe.com/p/session/{id}"),
            id,
        })
    }
}
