//! Request-body validation.
//!
//! [`ValidatedJson`] deserializes a JSON body and runs `validator` rules in
//! one step, rejecting with a field-level 400 before the handler runs.

use axum::{Json, extract::FromRequest, extract::Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::EncoreError;

/// JSON extractor that enforces the payload's `#[validate]` rules.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = EncoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| EncoreError::validation(format!("invalid JSON body: {e}")))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
