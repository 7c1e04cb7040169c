//! HTTP testing helpers: drive the router in-process, no listening socket.
//!
//! ```rust,ignore
//! let response = testing::get(app, "/api/posts")
//!     .execute()
//!     .await
//!     .assert_ok();
//! let body = response.json().await;
//! ```

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde::Serialize;
use tower::ServiceExt;

/// Request builder for one in-process round trip.
pub struct Scenario {
    app: Router,
    request: Request<Body>,
}

impl Scenario {
    #[must_use]
    pub fn new(app: Router, method: Method, uri: &str) -> Self {
        Self {
            app,
            request: Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        use axum::http::HeaderName;
        self.request.headers_mut().insert(
            HeaderName::from_bytes(key.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        self
    }

    /// Set the Authorization header with a bearer token.
    #[must_use]
    pub fn bearer_token(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {token}"))
    }

    /// Set a JSON body.
    #[must_use]
    pub fn json_body<T: Serialize>(mut self, body: &T) -> Self {
        let json = serde_json::to_string(body).unwrap();
        *self.request.body_mut() = Body::from(json);
        self.request
            .headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        self
    }

    /// Set a raw body (webhook tests need exact bytes).
    #[must_use]
    pub fn raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        *self.request.body_mut() = Body::from(body.into());
        self
    }

    /// Send the request and wrap the response for assertions.
    pub async fn execute(self) -> ScenarioAssert {
        let response = self.app.oneshot(self.request).await.unwrap();
        ScenarioAssert { response }
    }
}

/// Assertions over a completed response.
pub struct ScenarioAssert {
    response: axum::response::Response,
}

impl ScenarioAssert {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status(),
            expected,
            "expected status {expected}, got {}",
            self.response.status()
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_created(self) -> Self {
        self.assert_status(StatusCode::CREATED)
    }

    pub fn assert_no_content(self) -> Self {
        self.assert_status(StatusCode::NO_CONTENT)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_unauthorized(self) -> Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_forbidden(self) -> Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    /// Response header value, if present.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<String> {
        self.response
            .headers()
            .get(key)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Consume the response and parse the body as JSON.
    pub async fn json(self) -> serde_json::Value {
        let bytes = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    }
}

/// Start a GET scenario.
#[must_use]
pub fn get(app: Router, uri: &str) -> Scenario {
    Scenario::new(app, Method::GET, uri)
}

/// Start a POST scenario.
#[must_use]
pub fn post(app: Router, uri: &str) -> Scenario {
    Scenario::new(app, Method::POST, uri)
}

/// Start a PUT scenario.
#[must_use]
pub fn put(app: Router, uri: &str) -> Scenario {
    Scenario::new(app, Method::PUT, uri)
}

/// Start a DELETE scenario.
#[must_use]
pub fn delete(app: Router, uri: &str) -> Scenario {
    Scenario::new(app, Method::DELETE, uri)
}
