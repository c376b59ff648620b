/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use authgate_api::{app::AppState, config::Config};
/// use authgate_shared::adapter::MemoryAdapter;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryAdapter::new()), config)?;
/// let app = authgate_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{route_guard::route_guard, security::SecurityHeadersLayer},
};
use authgate_shared::{
    adapter::AuthAdapter,
    auth::oauth::{OAuthClient, OAuthError, OAuthRegistry},
    auth::password::PasswordAlgorithm,
    auth::session::SessionManager,
    routes::RouteTable,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub adapter: Arc<dyn AuthAdapter>,

    /// Session issuing and resolution
    pub sessions: Arc<SessionManager>,

    /// Route classification for the guard
    pub routes: Arc<RouteTable>,

    /// Enabled OAuth providers
    pub oauth: Arc<OAuthRegistry>,

    /// HTTP client for provider calls
    pub oauth_client: OAuthClient,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state with the default route table
    pub fn new(adapter: Arc<dyn AuthAdapter>, config: Config) -> Result<Self, OAuthError> {
        Self::with_routes(adapter, config, RouteTable::default())
    }

    /// Creates new application state with a custom route table
    pub fn with_routes(
        adapter: Arc<dyn AuthAdapter>,
        config: Config,
        routes: RouteTable,
    ) -> Result<Self, OAuthError> {
        let sessions = SessionManager::new(adapter.clone(), config.session_config());

        Ok(Self {
            adapter,
            sessions: Arc::new(sessions),
            routes: Arc::new(routes),
            oauth: Arc::new(config.oauth_registry()),
            oauth_client: OAuthClient::new()?,
            config: Arc::new(config),
        })
    }

    /// Algorithm for new password hashes
    pub fn password_algorithm(&self) -> PasswordAlgorithm {
        self.config.auth.password_algorithm
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                         # Landing page (public)
/// ├── GET  /health                   # Health check (public)
/// ├── /auth/                         # Auth pages (redirect when signed in)
/// │   ├── GET|POST /login
/// │   └── GET|POST /register
/// ├── /api/auth/                     # Auth API (never guarded)
/// │   ├── POST /signout
/// │   ├── GET  /session
/// │   ├── GET  /providers
/// │   ├── GET  /signin/:provider
/// │   └── GET  /callback/:provider
/// ├── GET  /settings                 # Protected
/// ├── GET  /dashboard                # Protected
/// └── GET  /api/me                   # Protected
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Route guard (session resolution + redirects)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let page_routes = Router::new()
        .route("/", get(routes::pages::home))
        .route("/health", get(routes::health::health_check))
        .route("/settings", get(routes::pages::settings))
        .route("/dashboard", get(routes::pages::dashboard))
        .route("/api/me", get(routes::pages::me));

    let auth_routes = Router::new()
        .route(
            "/login",
            get(routes::pages::login_page).post(routes::auth::login),
        )
        .route(
            "/register",
            get(routes::pages::register_page).post(routes::auth::register),
        );

    let api_auth_routes = Router::new()
        .route("/signout", post(routes::auth::signout))
        .route("/session", get(routes::auth::session))
        .route("/providers", get(routes::oauth::providers))
        .route("/signin/:provider", get(routes::oauth::signin))
        .route("/callback/:provider", get(routes::oauth::callback));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.is_empty()
        || state.config.api.cors_origins.iter().any(|o| o == "*")
    {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(page_routes)
        .nest("/auth", auth_routes)
        .nest("/api/auth", api_auth_routes)
        // Unrouted paths still pass through the guard
        .fallback(routes::pages::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            route_guard,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
