/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Create a credentials user
/// - `POST /auth/login` - Sign in with email and password, sets the session cookie
/// - `POST /api/auth/signout` - End the session, clears the cookie
/// - `GET /api/auth/session` - The current session, or `null`
///
/// Register and login answer with an [`ActionResult`] body. Any body that is
/// not a JSON object with valid fields yields `"Invalid fields!"`.

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::route_guard::{session_token, CurrentSession},
};
use authgate_shared::{
    actions::{self, ActionResult},
    auth::session::SessionData,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login response body
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub result: ActionResult,

    /// Where the client should navigate on success
    #[serde(rename = "redirectTo", skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

/// Parses a request body, mapping anything unparseable to `null`
fn form_value(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// HTTP status for an action's outcome
fn action_status(result: &ActionResult, success: StatusCode) -> StatusCode {
    match result.error.as_deref() {
        None => success,
        Some(actions::INVALID_FIELDS) => StatusCode::BAD_REQUEST,
        Some(actions::EMAIL_IN_USE) => StatusCode::CONFLICT,
        Some(actions::INVALID_CREDENTIALS) => StatusCode::UNAUTHORIZED,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Register a new user
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "at-least-14-chars", "username": "user" }
/// ```
///
/// - `201 Created`: `{ "success": "User created!" }`
/// - `400 Bad Request`: `{ "error": "Invalid fields!" }`
/// - `409 Conflict`: `{ "error": "Email already in use!" }`
pub async fn register(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let result = actions::register(
        state.adapter.as_ref(),
        form_value(&body),
        state.password_algorithm(),
    )
    .await;

    (action_status(&result, StatusCode::CREATED), Json(result))
}

/// Sign in with email and password
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "...", "callbackUrl": "/dashboard" }
/// ```
///
/// On success the session cookie is set and the body carries `redirectTo`.
///
/// - `200 OK`: `{ "success": "Signed in!", "redirectTo": "/dashboard" }`
/// - `400 Bad Request`: `{ "error": "Invalid fields!" }`
/// - `401 Unauthorized`: `{ "error": "Invalid credentials!" }`
pub async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = actions::login(&state.sessions, &state.routes, form_value(&body)).await;
    let status = action_status(&outcome.result, StatusCode::OK);

    let body = Json(LoginResponse {
        result: outcome.result,
        redirect_to: outcome.redirect_to,
    });

    match outcome.session {
        Some(issued) => (
            status,
            [(header::SET_COOKIE, state.sessions.session_cookie(&issued))],
            body,
        )
            .into_response(),
        None => (status, body).into_response(),
    }
}

/// Sign out
///
/// Revokes the session (if any) and clears the cookie. Succeeds even when
/// no session was present.
pub async fn signout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = session_token(&headers, &state.sessions) {
        actions::logout(&state.sessions, &token).await?;
    }

    Ok((
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Json(ActionResult::success("Signed out!")),
    )
        .into_response())
}

/// The current session
pub async fn session(session: Option<CurrentSession>) -> Json<Option<SessionData>> {
    Json(session.map(|s| s.data))
}
