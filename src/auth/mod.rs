//! Authentication: self-issued bearer tokens and OAuth sign-in.
//!
//! After a successful OAuth code exchange the server issues its own HS256
//! token carrying the user id, email and role; every request verifies that
//! token's signature, expiry, issuer and audience.

pub mod claims;
pub mod extractors;
pub mod issuer;
pub mod oauth;
pub mod verifier;

pub use claims::SessionClaims;
pub use extractors::{AdminUser, AuthUser, MemberUser, Viewer};
pub use issuer::{IssuedToken, TokenIssuer};
pub use oauth::{HttpIdentityProvider, IdentityProvider, MockIdentityProvider};
pub use verifier::TokenVerifier;
