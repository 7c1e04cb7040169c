//! Customer-portal session issuance.

use std::sync::Arc;

use crate::error::{EncoreError, Result};
use crate::store::UserRecord;
use super::client::{CreatePortalSessionRequest, PortalSession, StripeClient};

/// Opens customer-portal sessions for self-service subscription management.
pub struct PortalManager {
    client: Arc<dyn StripeClient>,
    return_url: String,
}

impl PortalManager {
    #[must_use]
    pub fn new(client: Arc<dyn StripeClient>, return_url: impl Into<String>) -> Self {
        Self {
            client,
            return_url: return_url.into(),
        }
    }

    /// Open a portal session for the user's existing billing customer.
    ///
    /// A user who has never checked out has no customer, which is the one
    /// legitimate validation error in this flow.
    pub async fn create_portal_session(&self, user: &UserRecord) -> Result<PortalSession> {
        let customer_id = user
            .stripe_customer_id
            .clone()
            .ok_or_else(|| EncoreError::validation("no billing customer for this account"))?;

        self.client
            .create_portal_session(CreatePortalSessionRequest {
                customer_id,
                return_url: self.return_url.clone(),
            })
            .await
    }
}
