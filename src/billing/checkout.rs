//! Hosted checkout for the gold tier.

use std::sync::Arc;

use crate::error::{EncoreError, Result};
use crate::store::{UserRecord, UserStore};
use super::client::{CheckoutSession, CreateCheckoutSessionRequest, StripeClient};
use super::customer::CustomerManager;

/// Checkout settings for the single gold price.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub gold_price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub trial_days: Option<u32>,
}

/// Opens hosted checkout sessions for the gold subscription.
pub struct CheckoutManager {
    customers: CustomerManager,
    client: Arc<dyn StripeClient>,
    config: CheckoutConfig,
}

impl CheckoutManager {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        client: Arc<dyn StripeClient>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            customers: CustomerManager::new(users, Arc::clone(&client)),
            client,
            config,
        }
    }

    /// Open a checkout session for the gold tier and return its redirect
    /// URL. The session is tagged with the user id so webhook processing
    /// can resolve it without any other lookup.
    pub async fn create_gold_checkout(&self, user: &UserRecord) -> Result<CheckoutSession> {
        if self.config.gold_price_id.is_empty() {
            return Err(EncoreError::service_unavailable(
                "billing is not configured",
            ));
        }

        let customer_id = self.customers.get_or_create(user).await?;

        self.client
            .create_checkout_session(CreateCheckoutSessionRequest {
                customer_id,
                price_id: self.config.gold_price_id.clone(),
                success_url: self.config.success_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
                trial_days: self.config.trial_days,
                user_id: user.id.clone(),
            })
            .await
    }
}
