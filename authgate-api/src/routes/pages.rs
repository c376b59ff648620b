/// Page endpoints
///
/// Pages are small JSON documents; rendering is left to a front end. Access
/// control is done entirely by the route guard:
///
/// - `GET /` - public
/// - `GET /auth/login`, `GET /auth/register` - redirect to `/settings` when
///   signed in
/// - `GET /settings`, `GET /dashboard`, `GET /api/me` - protected

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::route_guard::CurrentSession,
};
use authgate_shared::{
    auth::session::SessionUser,
    data,
    models::user::PublicUser,
    schemas::MIN_PASSWORD_LENGTH,
};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Landing page
#[derive(Debug, Serialize, Deserialize)]
pub struct HomePage {
    pub name: String,
    #[serde(rename = "signedIn")]
    pub signed_in: bool,
}

/// Query string of the sign-in page
#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,

    /// Error code set by a failed OAuth sign-in
    pub error: Option<String>,
}

/// Sign-in / sign-up page
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthPage {
    pub page: String,
    pub fields: Vec<String>,

    /// IDs of the enabled OAuth providers
    pub providers: Vec<String>,

    #[serde(rename = "callbackUrl", skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(rename = "minPasswordLength", skip_serializing_if = "Option::is_none")]
    pub min_password_length: Option<u64>,
}

/// A protected page rendered for the signed-in user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserPage {
    pub page: String,
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

fn provider_ids(state: &AppState) -> Vec<String> {
    state.oauth.providers().map(|p| p.id.clone()).collect()
}

/// User-facing text for an OAuth error code
fn error_message(code: &str) -> String {
    match code {
        "OAuthAccountNotLinked" => "Email already in use with different provider!".to_string(),
        _ => "Something went wrong!".to_string(),
    }
}

pub async fn home(session: Option<CurrentSession>) -> Json<HomePage> {
    Json(HomePage {
        name: "AuthGate".to_string(),
        signed_in: session.is_some(),
    })
}

pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginPageQuery>,
) -> Json<AuthPage> {
    Json(AuthPage {
        page: "login".to_string(),
        fields: vec!["email".to_string(), "password".to_string()],
        providers: provider_ids(&state),
        callback_url: query.callback_url,
        error: query.error.as_deref().map(error_message),
        min_password_length: None,
    })
}

pub async fn register_page(State(state): State<AppState>) -> Json<AuthPage> {
    Json(AuthPage {
        page: "register".to_string(),
        fields: vec![
            "email".to_string(),
            "password".to_string(),
            "username".to_string(),
        ],
        providers: provider_ids(&state),
        callback_url: None,
        error: None,
        min_password_length: Some(MIN_PASSWORD_LENGTH),
    })
}

pub async fn settings(session: CurrentSession) -> Json<UserPage> {
    Json(UserPage {
        page: "settings".to_string(),
        user: session.data.user,
        expires: session.data.expires,
    })
}

pub async fn dashboard(session: CurrentSession) -> Json<UserPage> {
    Json(UserPage {
        page: "dashboard".to_string(),
        user: session.data.user,
        expires: session.data.expires,
    })
}

/// The signed-in user's full public profile
pub async fn me(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<PublicUser>> {
    let user = data::get_user_by_id(state.adapter.as_ref(), session.data.user.id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicUser::from(&user)))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Page not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message("OAuthAccountNotLinked"),
            "Email already in use with different provider!"
        );
        assert_eq!(error_message("OAuthCallbackError"), "Something went wrong!");
    }
}
