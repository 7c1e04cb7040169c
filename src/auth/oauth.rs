//! OAuth authorization-code exchange.
//!
//! The identity provider sits behind a trait so the callback flow can be
//! exercised without network access. The live implementation posts the code
//! to the provider's token endpoint and fetches the userinfo profile.

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::OAuthConfig;
use crate::error::{EncoreError, Result};
use crate::store::OAuthIdentity;

/// Exchanges an authorization code for a verified identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity>;
}

/// Live provider speaking the standard token + userinfo endpoints.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    config: OAuthConfig,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(serde::Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl HttpIdentityProvider {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            (
                "client_secret",
                self.config.client_secret.expose_secret().as_str(),
            ),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EncoreError::unauthenticated(
                "authorization code exchange failed",
            ));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|_| EncoreError::unauthenticated("malformed token response"))?;

        let profile = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;

        if !profile.status().is_success() {
            return Err(EncoreError::unauthenticated("userinfo fetch failed"));
        }

        let info: UserInfo = profile
            .json()
            .await
            .map_err(|_| EncoreError::unauthenticated("malformed userinfo response"))?;

        let email = info.email.ok_or_else(|| {
            EncoreError::unauthenticated("identity provider returned no email")
        })?;

        Ok(OAuthIdentity {
            provider: self.config.provider_name.clone(),
            subject: info.sub,
            email,
            name: info.name.unwrap_or_default(),
            picture: info.picture,
        })
    }
}

/// Mock provider mapping preloaded codes to identities.
#[derive(Default)]
pub struct MockIdentityProvider {
    identities: std::sync::RwLock<std::collections::HashMap<String, OAuthIdentity>>,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, code: impl Into<String>, identity: OAuthIdentity) {
        self.identities
            .write()
            .unwrap()
            .insert(code.into(), identity);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<OAuthIdentity> {
        self.identities
            .read()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| EncoreError::unauthenticated("unknown authorization code"))
    }
}
