/// Integration tests for the route guard
///
/// Drives the full router over in-memory storage.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::{json, Value};

#[tokio::test]
async fn test_protected_routes_redirect_to_sign_in() {
    let ctx = TestContext::new();

    for (uri, expected) in [
        ("/settings", "/auth/login?callbackUrl=%2Fsettings"),
        ("/dashboard", "/auth/login?callbackUrl=%2Fdashboard"),
        ("/api/me", "/auth/login?callbackUrl=%2Fapi%2Fme"),
        (
            "/dashboard?tab=billing",
            "/auth/login?callbackUrl=%2Fdashboard%3Ftab%3Dbilling",
        ),
    ] {
        let response = ctx.get(uri, None).await;
        assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT, "{}", uri);
        assert_eq!(response.location(), Some(expected), "{}", uri);
    }
}

#[tokio::test]
async fn test_nested_protected_path_is_guarded() {
    let ctx = TestContext::new();

    let anonymous = ctx.get("/settings/profile", None).await;
    assert_eq!(anonymous.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        anonymous.location(),
        Some("/auth/login?callbackUrl=%2Fsettings%2Fprofile")
    );

    let cookie = ctx.signed_in("nested@example.com").await;
    let signed_in = ctx.get("/settings/profile", Some(&cookie)).await;
    assert_eq!(signed_in.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_and_api_auth_routes_are_never_redirected() {
    let ctx = TestContext::new();
    let cookie = ctx.signed_in("public@example.com").await;

    for cookie in [None, Some(cookie.as_str())] {
        let home = ctx.get("/", cookie).await;
        assert_eq!(home.status, StatusCode::OK);
        assert_eq!(home.body["signedIn"], cookie.is_some());

        let health = ctx.get("/health", cookie).await;
        assert_eq!(health.status, StatusCode::OK);
        assert_eq!(health.body["status"], "healthy");
        assert_eq!(health.body["storage"], "memory");

        let session = ctx.get("/api/auth/session", cookie).await;
        assert_eq!(session.status, StatusCode::OK);

        let providers = ctx.get("/api/auth/providers", cookie).await;
        assert_eq!(providers.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_unlisted_paths_pass_through() {
    let ctx = TestContext::new();

    let response = ctx.get("/about", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "not_found");
}

#[tokio::test]
async fn test_auth_pages_redirect_signed_in_users() {
    let ctx = TestContext::new();

    let anonymous = ctx.get("/auth/login", None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["page"], "login");
    assert_eq!(anonymous.body["providers"][0], "github");

    let cookie = ctx.signed_in("pages@example.com").await;
    for uri in ["/auth/login", "/auth/register"] {
        let response = ctx.get(uri, Some(&cookie)).await;
        assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.location(), Some("/settings"));
    }
}

#[tokio::test]
async fn test_signed_in_form_posts_redirect_with_see_other() {
    let ctx = TestContext::new();
    let cookie = ctx.signed_in("repost@example.com").await;

    for uri in ["/auth/login", "/auth/register"] {
        let response = ctx
            .post_json(
                uri,
                json!({ "email": "repost@example.com", "password": common::TEST_PASSWORD }),
                Some(&cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(response.location(), Some("/settings"), "{}", uri);
    }

    let settings = ctx.get("/settings", Some(&cookie)).await;
    assert_eq!(settings.status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_session_cookie_is_treated_as_signed_out() {
    let ctx = TestContext::new();

    let response = ctx
        .get("/settings", Some("authgate.session-token=forged-token"))
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);

    let session = ctx
        .get("/api/auth/session", Some("authgate.session-token=forged-token"))
        .await;
    assert_eq!(session.body, Value::Null);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let ctx = TestContext::new();

    for uri in ["/", "/settings", "/nowhere"] {
        let response = ctx.get(uri, None).await;
        assert_eq!(
            response.headers.get("X-Content-Type-Options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers.get("X-Frame-Options").unwrap(), "DENY");
    }
}
