//! Shared harness for integration tests: a fully wired application over
//! the in-memory store, mock Stripe client, mock identity provider, and a
//! recording mailer.

// Each test binary uses a different slice of this harness.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use encore::auth::MockIdentityProvider;
use encore::billing::MockStripeClient;
use encore::email::{Email, Mailer};
use encore::store::{InMemoryStore, OAuthIdentity, UserRecord, UserStore};
use encore::{AppState, Config, ConfigBuilder, Role, Stores};

pub const TOKEN_SECRET: &str = "test-token-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Mailer that records instead of sending.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> encore::Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
    pub stripe: Arc<MockStripeClient>,
    pub identity: Arc<MockIdentityProvider>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn base_config() -> encore::ConfigBuilder {
    ConfigBuilder::new()
        .with_token_secret(TOKEN_SECRET)
        .with_webhook_secret(WEBHOOK_SECRET)
        .with_gold_price_id("price_gold")
        .with_frontend_url("http://frontend.test")
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(base_config().build().unwrap())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let stripe = Arc::new(MockStripeClient::new());
        let identity = Arc::new(MockIdentityProvider::new());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState::new(
            config,
            Stores::from_shared(store.clone()),
            stripe.clone(),
            identity.clone(),
            mailer.clone(),
        );

        Self {
            store,
            state,
            stripe,
            identity,
            mailer,
        }
    }

    pub fn router(&self) -> Router {
        encore::App::new(self.state.clone()).router()
    }

    /// Create (or refresh) a user with the given role and mint a token.
    pub async fn user_with_role(&self, email: &str, role: Role) -> (UserRecord, String) {
        let user = self
            .store
            .upsert_oauth(&OAuthIdentity {
                provider: "google".to_string(),
                subject: format!("sub-{email}"),
                email: email.to_string(),
                name: "Test User".to_string(),
                picture: None,
            })
            .await
            .unwrap();
        self.store.set_role(&user.id, role).await.unwrap();
        let user = self.store.get_user(&user.id).await.unwrap().unwrap();
        let token = self.state.issuer.issue(&user).unwrap().token;
        (user, token)
    }
}

/// Build a valid `Stripe-Signature` header for a payload.
pub fn stripe_signature(payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let signed = format!("{timestamp}.{payload}");
    let mut mac =
        Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac accepts any key");
    mac.update(signed.as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
