//! Axum extractors for the three access levels.
//!
//! Missing or invalid credentials on a protected route are 401; a valid
//! credential with an insufficient role is 403; the two are never
//! conflated. Public endpoints use [`Viewer`], which degrades every failure
//! to an anonymous caller instead of rejecting.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::EncoreError;
use crate::roles::Role;
use crate::store::UserRecord;

/// Any signed-in user. Loads the fresh user record, so role changes made
/// by the billing webhook apply to the very next request.
pub struct AuthUser(pub UserRecord);

/// A signed-in user satisfying `MEMBER_FREE`.
pub struct MemberUser(pub UserRecord);

/// A signed-in admin.
pub struct AdminUser(pub UserRecord);

/// The caller's role for content gating, `None` for anonymous callers.
///
/// Uses the role claimed in the token: gating is a rendering decision, not
/// a mutation, and the claim's staleness is bounded by the token TTL.
pub struct Viewer(pub Option<Role>);

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Result<String, EncoreError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| EncoreError::unauthenticated("missing authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| EncoreError::unauthenticated("expected a bearer token"))?;

    if token.is_empty() {
        return Err(EncoreError::unauthenticated("empty bearer token"));
    }

    Ok(token.to_string())
}

async fn load_user(parts: &Parts, state: &AppState) -> Result<UserRecord, EncoreError> {
    let token = bearer_token(parts)?;
    let claims = state.verifier.verify(&token)?;
    state
        .users
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| EncoreError::unauthenticated("account no longer exists"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = EncoreError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthUser(load_user(parts, state).await?))
    }
}

impl FromRequestParts<AppState> for MemberUser {
    type Rejection = EncoreError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = load_user(parts, state).await?;
        if !user.role.satisfies(Role::MemberFree) {
            return Err(EncoreError::forbidden("membership required"));
        }
        Ok(MemberUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = EncoreError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = load_user(parts, state).await?;
        if !user.role.satisfies(Role::Admin) {
            return Err(EncoreError::forbidden("admin access required"));
        }
        Ok(AdminUser(user))
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = EncoreError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(token) = bearer_token(parts) else {
            return Ok(Viewer(None));
        };
        match state.verifier.verify(&token) {
            Ok(claims) => Ok(Viewer(Some(claims.role))),
            Err(_) => Ok(Viewer(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_a_bearer_token() {
        let parts = parts_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc123");
    }

    #[test]
    fn rejects_missing_header() {
        let parts = parts_with_auth(None);
        assert!(matches!(
            bearer_token(&parts),
            Err(EncoreError::Unauthenticated(_))
        ));
    }

    #[test]
    fn rejects_non_bearer_schemes() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn rejects_empty_token() {
        let parts = parts_with_auth(Some("Bearer "));
        assert!(bearer_token(&parts).is_err());
    }
}
