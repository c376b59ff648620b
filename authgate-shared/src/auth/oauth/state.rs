/// Signed OAuth state and PKCE.
///
/// The full state lives in an HMAC-signed cookie. Only its random nonce is
/// sent to the provider as the `state` parameter, so the PKCE verifier never
/// leaves the browser/server pair.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::OAuthError;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the signed state between sign-in and callback
pub const STATE_COOKIE_NAME: &str = "authgate.oauth-state";

/// How long a sign-in attempt stays valid
pub const STATE_MAX_AGE_SECS: i64 = 600;

/// State of one in-flight OAuth sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    pub provider: String,
    pub nonce: String,
    pub code_verifier: String,

    /// Where to send the user after sign-in
    pub callback_url: Option<String>,
    pub issued_at: i64,
}

fn random_string(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn mac(secret: &str) -> Result<HmacSha256, OAuthError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| OAuthError::InvalidState(e.to_string()))
}

impl OAuthState {
    pub fn new(provider: &str, callback_url: Option<String>) -> Self {
        Self {
            provider: provider.to_string(),
            nonce: random_string(32),
            code_verifier: random_string(64),
            callback_url,
            issued_at: Utc::now().timestamp(),
        }
    }

    /// S256 PKCE challenge for this state's verifier
    pub fn code_challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.code_verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Serializes and signs: `<base64 payload>.<base64 hmac>`
    pub fn sign(&self, secret: &str) -> Result<String, OAuthError> {
        let json =
            serde_json::to_vec(self).map_err(|e| OAuthError::InvalidState(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = mac(secret)?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    /// Checks the signature and age of a signed state
    pub fn verify(signed: &str, secret: &str) -> Result<Self, OAuthError> {
        let (payload, signature) = signed
            .split_once('.')
            .ok_or_else(|| OAuthError::InvalidState("malformed state".to_string()))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| OAuthError::InvalidState("malformed signature".to_string()))?;

        let mut mac = mac(secret)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| OAuthError::InvalidState("bad signature".to_string()))?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| OAuthError::InvalidState("malformed payload".to_string()))?;
        let state: OAuthState = serde_json::from_slice(&json)
            .map_err(|_| OAuthError::InvalidState("malformed payload".to_string()))?;

        let age = Utc::now().timestamp() - state.issued_at;
        if !(0..=STATE_MAX_AGE_SECS).contains(&age) {
            return Err(OAuthError::InvalidState("state expired".to_string()));
        }

        Ok(state)
    }
}
