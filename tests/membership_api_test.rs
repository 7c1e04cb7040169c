//! Sign-in, member self-service, and billing session issuance.

mod common;

use common::TestApp;
use encore::Role;
use encore::store::{OAuthIdentity, UserStore};
use encore::testing;

fn identity(email: &str) -> OAuthIdentity {
    OAuthIdentity {
        provider: "google".to_string(),
        subject: format!("sub-{email}"),
        email: email.to_string(),
        name: "New Fan".to_string(),
        picture: Some("https://img.example.com/a.png".to_string()),
    }
}

#[tokio::test]
async fn oauth_callback_upserts_and_redirects_with_token() {
    let app = TestApp::new();
    app.identity.register("code-1", identity("new@example.com"));

    let response = testing::get(app.router(), "/api/auth/callback?code=code-1")
        .execute()
        .await
        .assert_status(axum::http::StatusCode::TEMPORARY_REDIRECT);

    let location = response.header("location").unwrap();
    assert!(location.starts_with("http://frontend.test/auth/callback#token="));

    // The account exists now, as a plain user.
    let user = app
        .store
        .find_by_email("new@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, Role::User);

    // The token in the fragment works against the API.
    let token = location
        .split("#token=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap()
        .to_string();
    // A plain user is not yet a member, so the dashboard is forbidden --
    // but the credential itself is accepted (403, not 401).
    testing::get(app.router(), "/api/members/dashboard")
        .bearer_token(&token)
        .execute()
        .await
        .assert_forbidden();
}

#[tokio::test]
async fn callback_without_code_is_a_validation_error() {
    let app = TestApp::new();
    testing::get(app.router(), "/api/auth/callback")
        .execute()
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn signing_in_twice_does_not_duplicate_the_account() {
    let app = TestApp::new();
    app.identity.register("code-1", identity("fan@example.com"));
    app.identity.register("code-2", identity("fan@example.com"));

    for code in ["code-1", "code-2"] {
        testing::get(app.router(), &format!("/api/auth/callback?code={code}"))
            .execute()
            .await
            .assert_status(axum::http::StatusCode::TEMPORARY_REDIRECT);
    }

    let user = app
        .store
        .find_by_email("fan@example.com")
        .await
        .unwrap()
        .unwrap();
    // One account; role untouched by the re-login.
    assert_eq!(user.role, Role::User);
}

#[tokio::test]
async fn profile_self_service_round_trip() {
    let app = TestApp::new();
    let (_, token) = app.user_with_role("free@example.com", Role::MemberFree).await;

    let body = testing::get(app.router(), "/api/members/me")
        .bearer_token(&token)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["email"], "free@example.com");

    let body = testing::put(app.router(), "/api/members/me")
        .bearer_token(&token)
        .json_body(&serde_json::json!({
            "name": "Renamed Fan",
            "image_url": "https://img.example.com/new.png",
        }))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["name"], "Renamed Fan");

    // Bad image URL is a validation error.
    testing::put(app.router(), "/api/members/me")
        .bearer_token(&token)
        .json_body(&serde_json::json!({"image_url": "not a url"}))
        .execute()
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn account_deletion_cascades_and_invalidates_the_token() {
    let app = TestApp::new();
    let (user, token) = app.user_with_role("free@example.com", Role::MemberFree).await;

    testing::delete(app.router(), "/api/members/me")
        .bearer_token(&token)
        .execute()
        .await
        .assert_no_content();

    assert!(app.store.get_user(&user.id).await.unwrap().is_none());

    // The still-unexpired token no longer maps to an account.
    testing::get(app.router(), "/api/members/me")
        .bearer_token(&token)
        .execute()
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn checkout_returns_redirect_and_reuses_the_customer() {
    let app = TestApp::new();
    let (_, token) = app.user_with_role("fan@example.com", Role::User).await;

    let first = testing::post(app.router(), "/api/billing/checkout")
        .bearer_token(&token)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert!(first["url"].as_str().unwrap().contains("checkout.stripe.com"));

    // A second checkout does not mint a second customer.
    testing::post(app.router(), "/api/billing/checkout")
        .bearer_token(&token)
        .execute()
        .await
        .assert_ok();
    assert_eq!(app.stripe.created_customers().len(), 1);
}

#[tokio::test]
async fn portal_requires_an_existing_billing_customer() {
    let app = TestApp::new();
    let (_, token) = app.user_with_role("fan@example.com", Role::User).await;

    // Never checked out: 400 with a specific message.
    let body = testing::post(app.router(), "/api/billing/portal")
        .bearer_token(&token)
        .execute()
        .await
        .assert_bad_request()
        .json()
        .await;
    assert!(body["error"].as_str().unwrap().contains("no billing customer"));

    // After a checkout the portal opens.
    testing::post(app.router(), "/api/billing/checkout")
        .bearer_token(&token)
        .execute()
        .await
        .assert_ok();
    let body = testing::post(app.router(), "/api/billing/portal")
        .bearer_token(&token)
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert!(body["url"].as_str().unwrap().contains("billing.stripe.com"));
}

#[tokio::test]
async fn billing_endpoints_require_authentication() {
    let app = TestApp::new();
    testing::post(app.router(), "/api/billing/checkout")
        .execute()
        .await
        .assert_unauthorized();
    testing::post(app.router(), "/api/billing/portal")
        .execute()
        .await
        .assert_unauthorized();
}
