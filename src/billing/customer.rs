//! Billing-customer management.

use std::sync::Arc;

use crate::error::Result;
use crate::store::{UserRecord, UserStore};
use super::client::{CreateCustomerRequest, StripeClient};

/// Creates Stripe customers on first use and links them to local users.
pub struct CustomerManager {
    users: Arc<dyn UserStore>,
    client: Arc<dyn StripeClient>,
}

impl CustomerManager {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, client: Arc<dyn StripeClient>) -> Self {
        Self { users, client }
    }

    /// The user's Stripe customer id, created and persisted on first use.
    ///
    /// Idempotent: a user who already has a customer id never gets a second
    /// customer.
    pub async fn get_or_create(&self, user: &UserRecord) -> Result<String> {
        if let Some(customer_id) = &user.stripe_customer_id {
            return Ok(customer_id.clone());
        }

        let customer_id = self
            .client
            .create_customer(CreateCustomerRequest {
                email: user.email.clone(),
                name: Some(user.name.clone()),
                user_id: user.id.clone(),
            })
            .await?;

        self.users
            .set_stripe_customer_id(&user.id, &customer_id)
            .await?;

        Ok(customer_id)
    }
}
