/// OAuth endpoints
///
/// - `GET /api/auth/providers` - Enabled providers
/// - `GET /api/auth/signin/:provider` - Redirect to the provider's consent page
/// - `GET /api/auth/callback/:provider` - Complete sign-in, set the session cookie
///
/// Failures the user can act on (denied consent, an email already used by
/// another sign-in method) redirect back to the sign-in page with an `error`
/// code. Broken or forged requests get an error response.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use authgate_shared::{
    auth::{
        cookies,
        oauth::{sign_in_with_profile, OAuthError, OAuthState, STATE_COOKIE_NAME, STATE_MAX_AGE_SECS},
    },
    routes::is_local_path,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One entry of the providers list
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "signinUrl")]
    pub signin_url: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: String,
}

/// Query string of the sign-in redirect
#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Query string the provider sends back
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(
        state
            .oauth
            .providers()
            .map(|p| ProviderInfo {
                id: p.id.clone(),
                name: p.name.clone(),
                signin_url: format!("{}/api/auth/signin/{}", state.config.auth.base_url, p.id),
                callback_url: state.config.oauth_callback_url(&p.id),
            })
            .collect(),
    )
}

/// Starts an OAuth sign-in
///
/// Stores a signed state (PKCE verifier, callback URL) in a short-lived
/// cookie and redirects to the provider.
pub async fn signin(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    Query(query): Query<SignInQuery>,
) -> ApiResult<Response> {
    let provider = state.oauth.get(&provider_id)?;

    let callback_url = query.callback_url.filter(|url| is_local_path(url));
    let oauth_state = OAuthState::new(&provider.id, callback_url);
    let signed = oauth_state.sign(&state.config.auth.secret)?;

    let location = provider.authorization_url(
        &state.config.oauth_callback_url(&provider.id),
        &oauth_state.nonce,
        &oauth_state.code_challenge(),
    );
    let state_cookie = cookies::build_cookie(
        STATE_COOKIE_NAME,
        &signed,
        STATE_MAX_AGE_SECS,
        state.config.api.production,
    );

    Ok((
        [(header::SET_COOKIE, state_cookie)],
        Redirect::temporary(&location),
    )
        .into_response())
}

/// Completes an OAuth sign-in
pub async fn callback(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let provider = state.oauth.get(&provider_id)?;
    let clear_state = cookies::clear_cookie(STATE_COOKIE_NAME, state.config.api.production);

    if let Some(error) = query.error {
        warn!(provider = %provider.id, %error, "Provider returned an error");
        return Ok(error_redirect(&state, "OAuthCallbackError", clear_state));
    }

    let oauth_state = verify_state(&state, &headers, &provider.id, query.state.as_deref())?;
    let code = query
        .code
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let redirect_uri = state.config.oauth_callback_url(&provider.id);
    let tokens = state
        .oauth_client
        .exchange_code(provider, &code, &redirect_uri, &oauth_state.code_verifier)
        .await?;
    let profile = state
        .oauth_client
        .fetch_profile(provider, &tokens.access_token)
        .await?;

    let user = match sign_in_with_profile(state.adapter.as_ref(), &provider.id, &profile, &tokens)
        .await
    {
        Ok(user) => user,
        Err(OAuthError::AccountNotLinked) => {
            return Ok(error_redirect(&state, "OAuthAccountNotLinked", clear_state));
        }
        Err(e) => return Err(e.into()),
    };

    let issued = state.sessions.create_session(&user).await?;
    let destination = state
        .routes
        .post_login_redirect(oauth_state.callback_url.as_deref());
    info!(user_id = %user.id, provider = %provider.id, "OAuth sign-in complete");

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, state.sessions.session_cookie(&issued)),
            (header::SET_COOKIE, clear_state),
        ]),
        Redirect::temporary(&destination),
    )
        .into_response())
}

/// Checks the state cookie against the `state` parameter and provider
fn verify_state(
    state: &AppState,
    headers: &HeaderMap,
    provider_id: &str,
    nonce: Option<&str>,
) -> Result<OAuthState, OAuthError> {
    let signed = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| cookies::read_cookie(v, STATE_COOKIE_NAME))
        .ok_or_else(|| OAuthError::InvalidState("missing state cookie".to_string()))?;

    let oauth_state = OAuthState::verify(&signed, &state.config.auth.secret)?;

    if oauth_state.provider != provider_id {
        return Err(OAuthError::InvalidState("provider mismatch".to_string()));
    }
    if nonce != Some(oauth_state.nonce.as_str()) {
        return Err(OAuthError::InvalidState("state mismatch".to_string()));
    }

    Ok(oauth_state)
}

fn error_redirect(state: &AppState, code: &str, clear_state: String) -> Response {
    let location = format!("{}?error={}", state.routes.sign_in_path, code);
    (
        [(header::SET_COOKIE, clear_state)],
        Redirect::temporary(&location),
    )
        .into_response()
}
