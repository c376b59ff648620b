/// HTTP calls to OAuth providers.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::provider::{primary_github_email, OAuthProfile, OAuthProvider};
use super::OAuthError;
use crate::models::account::AccountTokens;

/// Tokens returned by a provider's token endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

impl OAuthTokens {
    /// Parses a token endpoint response
    ///
    /// GitHub reports failures with a 200 and an `error` field, so that is
    /// checked before anything else.
    pub fn from_response(v: &Value) -> Result<Self, OAuthError> {
        if let Some(error) = v["error"].as_str() {
            let description = v["error_description"].as_str().unwrap_or(error);
            return Err(OAuthError::Provider(format!(
                "Token exchange returned error: {}",
                description
            )));
        }

        let access_token = v["access_token"]
            .as_str()
            .ok_or_else(|| OAuthError::Provider("Missing access_token in token response".to_string()))?;

        Ok(Self {
            access_token: access_token.to_string(),
            refresh_token: v["refresh_token"].as_str().map(String::from),
            expires_in: v["expires_in"].as_i64(),
            token_type: v["token_type"].as_str().map(String::from),
            scope: v["scope"].as_str().map(String::from),
            id_token: v["id_token"].as_str().map(String::from),
        })
    }

    /// Converts to the stored form, resolving `expires_in` to a timestamp
    pub fn to_account_tokens(&self) -> AccountTokens {
        AccountTokens {
            access_token: Some(self.access_token.clone()),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_in.map(|secs| Utc::now().timestamp() + secs),
            token_type: self.token_type.clone(),
            scope: self.scope.clone(),
            id_token: self.id_token.clone(),
            session_state: None,
        }
    }
}

/// Thin reqwest wrapper for the token and profile endpoints
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new() -> Result<Self, OAuthError> {
        // GitHub's API rejects requests without a user agent
        let http = reqwest::Client::builder()
            .user_agent(concat!("authgate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OAuthError::Provider(e.to_string()))?;

        Ok(Self { http })
    }

    /// Trades an authorization code for tokens
    pub async fn exchange_code(
        &self,
        provider: &OAuthProvider,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<OAuthTokens, OAuthError> {
        let response = self
            .http
            .post(&provider.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", provider.client_id.as_str()),
                ("client_secret", provider.client_secret.as_str()),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Provider(format!("Token exchange failed: {}", e)))?;

        let body = Self::json_body(response).await?;
        debug!(provider = %provider.id, "Exchanged authorization code");
        OAuthTokens::from_response(&body)
    }

    /// Fetches and maps the user's profile
    ///
    /// For providers with an emails endpoint, the primary address and its
    /// verification status come from there.
    pub async fn fetch_profile(
        &self,
        provider: &OAuthProvider,
        access_token: &str,
    ) -> Result<OAuthProfile, OAuthError> {
        let body = self.get_json(&provider.user_info_url, access_token).await?;
        let mut profile = (provider.map_profile)(&body)
            .map_err(|e| OAuthError::Provider(format!("Failed to map user info: {}", e)))?;

        if let Some(emails_url) = &provider.emails_url {
            match self.get_json(emails_url, access_token).await {
                Ok(emails) => {
                    if let Some((email, verified)) = primary_github_email(&emails) {
                        profile.email = Some(email);
                        profile.email_verified = verified;
                    }
                }
                Err(e) => warn!(provider = %provider.id, error = %e, "Failed to fetch emails"),
            }
        }

        Ok(profile)
    }

    async fn get_json(&self, url: &str, access_token: &str) -> Result<Value, OAuthError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| OAuthError::Provider(format!("Request to {} failed: {}", url, e)))?;

        Self::json_body(response).await
    }

    async fn json_body(response: reqwest::Response) -> Result<Value, OAuthError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OAuthError::Provider(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(format!("Failed to parse response: {}", e)))
    }
}
