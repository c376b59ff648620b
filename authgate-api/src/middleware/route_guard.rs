/// Route guard middleware
///
/// Runs on every request:
///
/// 1. Reads the session token from the session cookie, or from an
///    `Authorization: Bearer` header for API clients.
/// 2. Resolves it through the [`SessionManager`](authgate_shared::auth::session::SessionManager).
/// 3. Asks the [`RouteTable`](authgate_shared::routes::RouteTable) whether the
///    request may continue, redirecting when it may not.
///
/// A resolved session is inserted into the request extensions as
/// [`CurrentSession`], which handlers extract directly.

use crate::{app::AppState, error::ApiError};
use authgate_shared::auth::session::{SessionData, SessionManager};
use authgate_shared::routes::RouteDecision;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

/// The signed-in user's session, available to handlers
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// Raw token the session was resolved from
    pub token: String,
    pub data: SessionData,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))
    }
}

/// Finds the session token in a request's headers
///
/// The cookie wins over a Bearer header.
pub fn session_token(headers: &HeaderMap, sessions: &SessionManager) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| sessions.token_from_cookie_header(v));

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    })
}

/// Route guard layer, installed with `axum::middleware::from_fn_with_state`
pub async fn route_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut current = None;

    if let Some(token) = session_token(req.headers(), &state.sessions) {
        match state.sessions.resolve(&token).await {
            Ok(Some(data)) => current = Some(CurrentSession { token, data }),
            Ok(None) => debug!("Ignoring invalid session token"),
            // Treat as signed out rather than failing the request
            Err(e) => warn!(error = %e, "Failed to resolve session"),
        }
    }

    let path = req.uri().path().to_owned();
    let decision = state
        .routes
        .decide(&path, req.uri().query(), current.is_some());

    match decision {
        RouteDecision::Allow => {
            if let Some(current) = current {
                req.extensions_mut().insert(current);
            }
            next.run(req).await
        }
        RouteDecision::Redirect(location) => {
            debug!(%path, %location, method = %req.method(), "Route guard redirect");
            // Redirect targets are pages: only safe methods may be replayed
            if matches!(*req.method(), Method::GET | Method::HEAD) {
                Redirect::temporary(&location).into_response()
            } else {
                Redirect::to(&location).into_response()
            }
        }
    }
}
