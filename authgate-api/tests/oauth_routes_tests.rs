/// Integration tests for the OAuth endpoints
///
/// Provider calls are not made here; these tests cover everything up to the
/// code exchange.

mod common;

use authgate_shared::auth::oauth::{OAuthState, STATE_COOKIE_NAME};
use axum::http::StatusCode;
use common::{TestContext, TEST_SECRET};

#[tokio::test]
async fn test_providers_list() {
    let ctx = TestContext::new();

    let response = ctx.get("/api/auth/providers", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let providers = response.body.as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["id"], "github");
    assert_eq!(
        providers[0]["callbackUrl"],
        "http://localhost:3000/api/auth/callback/github"
    );
}

#[tokio::test]
async fn test_signin_redirects_to_provider_with_state_cookie() {
    let ctx = TestContext::new();

    let response = ctx
        .get("/api/auth/signin/github?callbackUrl=%2Fdashboard", None)
        .await;

    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    let location = response.location().unwrap();
    assert!(location.starts_with("https://github.com/login/oauth/authorize?client_id=test-github-id"));
    assert!(location.contains("code_challenge_method=S256"));

    let cookie = response.cookie(STATE_COOKIE_NAME).unwrap();
    let signed = cookie.split_once('=').unwrap().1;
    let state = OAuthState::verify(signed, TEST_SECRET).unwrap();
    assert_eq!(state.provider, "github");
    assert_eq!(state.callback_url.as_deref(), Some("/dashboard"));
    assert!(location.contains(&format!("state={}", state.nonce)));
    assert!(!location.contains(&state.code_verifier));
}

#[tokio::test]
async fn test_signin_drops_foreign_callback() {
    let ctx = TestContext::new();

    let response = ctx
        .get("/api/auth/signin/github?callbackUrl=https%3A%2F%2Fevil.example.com", None)
        .await;

    let cookie = response.cookie(STATE_COOKIE_NAME).unwrap();
    let state = OAuthState::verify(cookie.split_once('=').unwrap().1, TEST_SECRET).unwrap();
    assert!(state.callback_url.is_none());
}

#[tokio::test]
async fn test_unknown_provider() {
    let ctx = TestContext::new();

    let response = ctx.get("/api/auth/signin/google", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "not_found");
}

#[tokio::test]
async fn test_callback_with_provider_error_redirects_to_sign_in() {
    let ctx = TestContext::new();

    let response = ctx
        .get("/api/auth/callback/github?error=access_denied", None)
        .await;

    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location(), Some("/auth/login?error=OAuthCallbackError"));
}

#[tokio::test]
async fn test_callback_rejects_missing_or_mismatched_state() {
    let ctx = TestContext::new();

    let missing = ctx
        .get("/api/auth/callback/github?code=abc&state=nonce", None)
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let signin = ctx.get("/api/auth/signin/github", None).await;
    let cookie = signin.cookie(STATE_COOKIE_NAME).unwrap();

    let mismatched = ctx
        .get("/api/auth/callback/github?code=abc&state=not-the-nonce", Some(&cookie))
        .await;
    assert_eq!(mismatched.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatched.body["error"], "bad_request");
}

#[tokio::test]
async fn test_callback_without_code() {
    let ctx = TestContext::new();
    let signin = ctx.get("/api/auth/signin/github", None).await;
    let cookie = signin.cookie(STATE_COOKIE_NAME).unwrap();
    let state = OAuthState::verify(cookie.split_once('=').unwrap().1, TEST_SECRET).unwrap();

    let response = ctx
        .get(
            &format!("/api/auth/callback/github?state={}", state.nonce),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_page_shows_account_not_linked_error() {
    let ctx = TestContext::new();

    let response = ctx
        .get("/auth/login?error=OAuthAccountNotLinked", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["error"],
        "Email already in use with different provider!"
    );
}
