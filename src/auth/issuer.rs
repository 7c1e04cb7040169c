//! Session-token issuance.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::config::AuthConfig;
use crate::error::{EncoreError, Result};
use crate::store::UserRecord;
use super::claims::SessionClaims;

/// An issued bearer token plus its lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until expiry.
    pub expires_in: u64,
    pub token_type: &'static str,
}

/// Issues HS256 session tokens for locally signed-in users.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    ttl_seconds: u64,
}

impl TokenIssuer {
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(
                config.token_secret.expose_secret().as_bytes(),
            ),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl_seconds: config.token_ttl_seconds,
        }
    }

    /// Issue a token for a user; the role claim snapshots the user's role
    /// at issue time.
    pub fn issue(&self, user: &UserRecord) -> Result<IssuedToken> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: Some(user.name.clone()),
            role: user.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: now + self.ttl_seconds,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| EncoreError::internal(format!("token encoding failed: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl_seconds,
            token_type: "Bearer",
        })
    }
}
