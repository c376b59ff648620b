#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory app (no database needed)
/// - Request helpers driving the router with `tower::ServiceExt::oneshot`
/// - Sign-up / sign-in shortcuts returning a session cookie

use authgate_api::app::{build_router, AppState};
use authgate_api::config::Config;
use authgate_shared::adapter::MemoryAdapter;
use authgate_shared::auth::oauth::OAuthRegistry;
use authgate_shared::auth::session::SessionStrategy;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

/// A response, with the body parsed as JSON (`Null` when empty or not JSON)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// All `Set-Cookie` values
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    /// `name=value` of the first `Set-Cookie` for `name`, ready for a `Cookie` header
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookies()
            .into_iter()
            .filter_map(|c| c.split(';').next().map(str::to_string))
            .find(|pair| pair.starts_with(&format!("{}=", name)))
    }
}

/// Test context containing the router and its storage
pub struct TestContext {
    pub app: Router,
    pub adapter: Arc<MemoryAdapter>,
    pub state: AppState,
}

impl TestContext {
    /// App with database sessions and GitHub enabled
    pub fn new() -> Self {
        Self::with_strategy(SessionStrategy::Database)
    }

    pub fn with_strategy(strategy: SessionStrategy) -> Self {
        let strategy = match strategy {
            SessionStrategy::Database => "database",
            SessionStrategy::Jwt => "jwt",
        };
        let vars: HashMap<&str, &str> = [
            ("AUTH_SECRET", TEST_SECRET),
            ("AUTH_URL", "http://localhost:3000"),
            ("AUTH_SESSION_STRATEGY", strategy),
            ("GITHUB_CLIENT_ID", "test-github-id"),
            ("GITHUB_CLIENT_SECRET", "test-github-secret"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("Failed to build test config");

        let adapter = Arc::new(MemoryAdapter::new());
        let state = AppState::new(adapter.clone(), config).expect("Failed to build app state");
        let app = build_router(state.clone());

        Self {
            app,
            adapter,
            state,
        }
    }

    /// Replaces the enabled OAuth providers, e.g. with ones pointing at a mock server
    pub fn with_oauth_registry(mut self, registry: OAuthRegistry) -> Self {
        self.state.oauth = Arc::new(registry);
        self.app = build_router(self.state.clone());
        self
    }

    /// Sends a request through the full middleware stack
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router should not fail");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.post_raw(uri, body.to_string(), cookie).await
    }

    pub async fn post_raw(&self, uri: &str, body: String, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn register(&self, email: &str) -> TestResponse {
        self.post_json(
            "/auth/register",
            json!({ "email": email, "password": TEST_PASSWORD }),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/auth/login",
            json!({ "email": email, "password": password }),
            None,
        )
        .await
    }

    /// Registers and signs in, returning the session cookie pair
    pub async fn signed_in(&self, email: &str) -> String {
        let registered = self.register(email).await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let login = self.login(email, TEST_PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK);
        login
            .cookie(&self.state.sessions.config().cookie_name)
            .expect("Login should set the session cookie")
    }
}
