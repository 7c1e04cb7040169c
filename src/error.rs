use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The error taxonomy used across the whole crate.
///
/// Every handler returns `Result<T>`; the variant decides the HTTP status
/// and whether the message may be shown to the client.
#[derive(Debug, thiserror::Error)]
pub enum EncoreError {
    /// Resource does not exist, or is not visible to this caller.
    ///
    /// Unpublished content intentionally maps here for non-admin callers so
    /// its existence is not leaked.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input: missing field, bad email, invalid enum value.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No credential, or an invalid/expired one.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid credential, insufficient role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Webhook payload failed signature verification.
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl EncoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn signature_invalid(msg: impl Into<String>) -> Self {
        Self::SignatureInvalid(msg.into())
    }

    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::TooManyRequests(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::SignatureInvalid(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to clients.
    ///
    /// Client errors (4xx) pass through so the caller can correct the
    /// request. Server errors collapse to a generic message; the full detail
    /// only reaches the log.
    fn safe_message(&self) -> String {
        match self {
            Self::NotFound(_)
            | Self::Validation(_)
            | Self::Unauthenticated(_)
            | Self::Forbidden(_)
            | Self::SignatureInvalid(_)
            | Self::TooManyRequests(_) => self.to_string(),
            Self::ServiceUnavailable(_) => "Service unavailable".to_string(),
            Self::Internal(_) | Self::Anyhow(_) => "Internal error".to_string(),
        }
    }
}

/// Wire format for error responses.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_id: String,
}

impl IntoResponse for EncoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        // Full detail goes to the log; the body only carries safe_message.
        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "request failed"
        );

        let body = Json(ErrorBody {
            error: self.safe_message(),
            error_id,
        });

        (status, body).into_response()
    }
}

/// Result type alias used by handlers and managers.
pub type Result<T> = std::result::Result<T, EncoreError>;

impl From<serde_json::Error> for EncoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            EncoreError::Validation(format!("invalid JSON: {}", err))
        } else {
            EncoreError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<reqwest::Error> for EncoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            EncoreError::ServiceUnavailable(format!("upstream connection error: {}", err))
        } else {
            EncoreError::Internal(format!("upstream request error: {}", err))
        }
    }
}

impl From<validator::ValidationErrors> for EncoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field_errors: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.as_ref()))
                    .collect();
                if messages.is_empty() {
                    format!("{}: invalid", field)
                } else {
                    format!("{}: {}", field, messages.join(", "))
                }
            })
            .collect();

        EncoreError::Validation(field_errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            EncoreError::not_found("post").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EncoreError::validation("email required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EncoreError::signature_invalid("bad v1").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EncoreError::unauthenticated("missing token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            EncoreError::forbidden("admin only").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            EncoreError::too_many_requests("slow down").status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            EncoreError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_errors_keep_their_message() {
        assert_eq!(
            EncoreError::not_found("post 42").safe_message(),
            "Not found: post 42"
        );
        assert_eq!(
            EncoreError::forbidden("admin only").safe_message(),
            "Forbidden: admin only"
        );
    }

    #[test]
    fn server_errors_are_collapsed() {
        assert_eq!(
            EncoreError::internal("db password is hunter2").safe_message(),
            "Internal error"
        );
        let err: EncoreError = anyhow::anyhow!("stack details").into();
        assert_eq!(err.safe_message(), "Internal error");
    }

    #[test]
    fn serde_errors_map_to_validation() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: EncoreError = parse.unwrap_err().into();
        assert!(matches!(err, EncoreError::Validation(_)));
    }

    #[test]
    fn validator_errors_join_fields() {
        use validator::Validate;

        #[derive(Validate)]
        struct Form {
            #[validate(email)]
            email: String,
        }

        let form = Form {
            email: "not-an-email".to_string(),
        };
        let err: EncoreError = form.validate().unwrap_err().into();
        assert!(matches!(err, EncoreError::Validation(_)));
        assert!(err.to_string().contains("email"));
    }

    #[tokio::test]
    async fn into_response_sets_status_and_error_id() {
        let response = EncoreError::not_found("thing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Not found: thing");
        assert!(uuid::Uuid::parse_str(json["error_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn internal_detail_never_reaches_the_wire() {
        let response = EncoreError::internal("secret detail").into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal error");
    }
}
