//! Session-token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::ExposeSecret;

use crate::config::AuthConfig;
use crate::error::{EncoreError, Result};
use super::claims::SessionClaims;

/// Verifies HS256 session tokens: signature, expiry, issuer and audience
/// are all checked on every call.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;
        validation.set_issuer(&[config.issuer.clone()]);
        validation.set_audience(&[config.audience.clone()]);

        Self {
            decoding_key: DecodingKey::from_secret(config.token_secret.expose_secret().as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| EncoreError::unauthenticated(format!("invalid token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::roles::Role;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn auth_config(secret: &str) -> AuthConfig {
        ConfigBuilder::new()
            .with_token_secret(secret)
            .build()
            .unwrap()
            .auth
    }

    fn raw_token(secret: &str, claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn base_claims() -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        serde_json::json!({
            "sub": "u1",
            "email": "fan@example.com",
            "role": "MEMBER_FREE",
            "iss": "encore",
            "aud": "encore-web",
            "exp": now + 3600,
            "iat": now,
            "jti": "t1",
        })
    }

    #[test]
    fn rejects_wrong_signature() {
        let verifier = TokenVerifier::from_config(&auth_config("right-secret"));
        let token = raw_token("wrong-secret", &base_claims());
        assert!(matches!(
            verifier.verify(&token),
            Err(EncoreError::Unauthenticated(_))
        ));
    }

    #[test]
    fn rejects_expired_tokens() {
        let verifier = TokenVerifier::from_config(&auth_config("secret-1"));
        let mut claims = base_claims();
        claims["exp"] = serde_json::json!(chrono::Utc::now().timestamp() - 3600);
        let token = raw_token("secret-1", &claims);
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn rejects_wrong_issuer_and_audience() {
        let verifier = TokenVerifier::from_config(&auth_config("secret-1"));

        let mut claims = base_claims();
        claims["iss"] = serde_json::json!("someone-else");
        assert!(verifier.verify(&raw_token("secret-1", &claims)).is_err());

        let mut claims = base_claims();
        claims["aud"] = serde_json::json!("other-app");
        assert!(verifier.verify(&raw_token("secret-1", &claims)).is_err());
    }

    #[test]
    fn unknown_role_claims_read_as_plain_user() {
        let verifier = TokenVerifier::from_config(&auth_config("secret-1"));
        let mut claims = base_claims();
        claims["role"] = serde_json::json!("SUPER_WIZARD");
        let parsed = verifier.verify(&raw_token("secret-1", &claims)).unwrap();
        assert_eq!(parsed.role, Role::User);
    }
}
