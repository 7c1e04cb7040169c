//! Live Stripe client over the REST API.
//!
//! The three calls this system makes are plain form POSTs, so they go
//! through the crate's existing HTTP client rather than a full SDK surface.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::{EncoreError, Result};
use super::client::{
    CheckoutSession, CreateCheckoutSessionRequest, CreateCustomerRequest,
    CreatePortalSessionRequest, PortalSession, StripeClient,
};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error returned when the API key has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidApiKeyError {
    pub reason: String,
}

impl std::fmt::Display for InvalidApiKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid Stripe API key: {}", self.reason)
    }
}

impl std::error::Error for InvalidApiKeyError {}

/// Secret keys and restricted keys, test or live mode.
fn validate_api_key(key: &str) -> std::result::Result<(), InvalidApiKeyError> {
    const MIN_KEY_LENGTH: usize = 20;

    if key.len() < MIN_KEY_LENGTH {
        return Err(InvalidApiKeyError {
            reason: format!("key too short (minimum {MIN_KEY_LENGTH} characters)"),
        });
    }

    let valid_prefixes = ["sk_test_", "sk_live_", "rk_test_", "rk_live_"];
    if !valid_prefixes.iter().any(|p| key.starts_with(p)) {
        return Err(InvalidApiKeyError {
            reason: "key must start with sk_test_, sk_live_, rk_test_, or rk_live_".to_string(),
        });
    }

    Ok(())
}

/// Stripe client backed by the REST API.
pub struct LiveStripeClient {
    http: reqwest::Client,
    api_key: SecretString,
    api_base: String,
}

#[derive(serde::Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(serde::Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

impl LiveStripeClient {
    /// Create a client after validating the API key shape.
    pub fn new(
        api_key: impl Into<SecretString>,
    ) -> std::result::Result<Self, InvalidApiKeyError> {
        let api_key: SecretString = api_key.into();
        validate_api_key(api_key.expose_secret())?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");

        Ok(Self {
            http,
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API base (test servers).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .http
            .post(format!("{}{path}", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, path, body = %body, "Stripe API call failed");
            return Err(match status.as_u16() {
                429 | 500..=599 => {
                    EncoreError::service_unavailable(format!("Stripe returned {status}"))
                }
                _ => EncoreError::internal(format!("Stripe returned {status}")),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl StripeClient for LiveStripeClient {
    async fn create_customer(&self, request: CreateCustomerRequest) -> Result<String> {
        let mut form = vec![
            ("email".to_string(), request.email),
            ("metadata[user_id]".to_string(), request.user_id),
        ];
        if let Some(name) = request.name {
            form.push(("name".to_string(), name));
        }

        let customer: CustomerResponse = self.post_form("/v1/customers", &form).await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSession> {
        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("customer".to_string(), request.customer_id),
            ("success_url".to_string(), request.success_url),
            ("cancel_url".to_string(), request.cancel_url),
            ("line_items[0][price]".to_string(), request.price_id),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("metadata[user_id]".to_string(), request.user_id.clone()),
            (
                "subscription_data[metadata][user_id]".to_string(),
                request.user_id,
            ),
        ];
        if let Some(days) = request.trial_days {
            form.push((
                "subscription_data[trial_period_days]".to_string(),
                days.to_string(),
            ));
        }

        let session: SessionResponse = self.post_form("/v1/checkout/sessions", &form).await?;
        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    async fn create_portal_session(
        &self,
        request: CreatePortalSessionRequest,
    ) -> Result<PortalSession> {
        let form = vec![
            ("customer".to_string(), request.customer_id),
            ("return_url".to_string(), request.return_url),
        ];

        let session: SessionResponse = self
            .post_form("/v1/billing_portal/sessions", &form)
            .await?;
        Ok(PortalSession {
            id: session.id,
            url: session.url,
        })
    }
}
