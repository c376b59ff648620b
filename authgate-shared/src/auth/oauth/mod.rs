/// OAuth sign-in (authorization code flow with PKCE)
///
/// 1. `/api/auth/signin/:provider` creates an [`OAuthState`], stores it signed
///    in a cookie and redirects to [`OAuthProvider::authorization_url`].
/// 2. The provider redirects back to `/api/auth/callback/:provider` with a
///    `code` and the state nonce.
/// 3. The callback verifies the state, calls [`OAuthClient::exchange_code`]
///    and [`OAuthClient::fetch_profile`], then [`sign_in_with_profile`].

pub mod client;
pub mod flow;
pub mod provider;
pub mod state;

use std::collections::BTreeMap;

use crate::adapter::AdapterError;

pub use client::{OAuthClient, OAuthTokens};
pub use flow::sign_in_with_profile;
pub use provider::{OAuthProfile, OAuthProvider};
pub use state::{OAuthState, STATE_COOKIE_NAME, STATE_MAX_AGE_SECS};

/// Error type for OAuth operations
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Unknown OAuth provider: {0}")]
    UnknownProvider(String),

    /// Missing, forged, mismatched or expired state
    #[error("Invalid OAuth state: {0}")]
    InvalidState(String),

    /// The provider's email belongs to a user who never linked this account
    #[error("OAuthAccountNotLinked")]
    AccountNotLinked,

    #[error("OAuth provider did not return an email address")]
    MissingEmail,

    /// Token exchange or profile fetch failed
    #[error("OAuth provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// The providers this deployment has credentials for
#[derive(Debug, Clone, Default)]
pub struct OAuthRegistry {
    providers: BTreeMap<String, OAuthProvider>,
}

impl OAuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a provider
    pub fn with(mut self, provider: OAuthProvider) -> Self {
        self.providers.insert(provider.id.clone(), provider);
        self
    }

    pub fn get(&self, id: &str) -> Result<&OAuthProvider, OAuthError> {
        self.providers
            .get(id)
            .ok_or_else(|| OAuthError::UnknownProvider(id.to_string()))
    }

    /// Configured providers, ordered by ID
    pub fn providers(&self) -> impl Iterator<Item = &OAuthProvider> {
        self.providers.values()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = OAuthRegistry::new()
            .with(OAuthProvider::google("g", "gs"))
            .with(OAuthProvider::github("h", "hs"));

        let ids: Vec<&str> = registry.providers().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["github", "google"]);
        assert_eq!(registry.get("github").unwrap().client_id, "h");
        assert!(matches!(
            registry.get("gitlab"),
            Err(OAuthError::UnknownProvider(_))
        ));
        assert!(OAuthRegistry::new().is_empty());
    }
}
