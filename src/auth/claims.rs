//! Claims carried by self-issued session tokens.

use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// JWT claims for a signed-in user.
///
/// The role claim rides along so the frontend can adapt its UI without an
/// extra request; role-gated *operations* re-check against the stored user
/// record where freshness matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Local user id.
    pub sub: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parsed fail-closed: an unrecognized value reads as `USER`.
    pub role: Role,
    pub iss: String,
    pub aud: String,
    /// Expiry (Unix seconds).
    pub exp: u64,
    /// Issued-at (Unix seconds).
    pub iat: u64,
    /// Unique token id.
    pub jti: String,
}
