/// OAuth provider endpoints and profile mapping.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user profile as reported by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthProfile {
    /// Provider-side account ID
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,

    /// Whether the provider asserts the email is verified
    pub email_verified: bool,
}

/// Static configuration of one OAuth provider
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    /// Short name used in URLs (`github`, `google`)
    pub id: String,
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,

    /// Secondary endpoint listing the user's emails (GitHub only)
    pub emails_url: Option<String>,
    pub scopes: Vec<String>,
    pub map_profile: fn(&Value) -> Result<OAuthProfile, String>,
}

impl OAuthProvider {
    pub fn github(client_id: &str, client_secret: &str) -> Self {
        Self {
            id: "github".to_string(),
            name: "GitHub".to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            auth_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            user_info_url: "https://api.github.com/user".to_string(),
            emails_url: Some("https://api.github.com/user/emails".to_string()),
            scopes: vec!["read:user".to_string(), "user:email".to_string()],
            map_profile: map_github_profile,
        }
    }

    pub fn google(client_id: &str, client_secret: &str) -> Self {
        Self {
            id: "google".to_string(),
            name: "Google".to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            user_info_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            emails_url: None,
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            map_profile: map_google_profile,
        }
    }

    /// URL the browser is sent to for consent
    pub fn authorization_url(&self, redirect_uri: &str, state: &str, code_challenge: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scopes.join(" ")),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }
}

fn map_github_profile(v: &Value) -> Result<OAuthProfile, String> {
    let id = v["id"]
        .as_i64()
        .map(|i| i.to_string())
        .or_else(|| v["id"].as_str().map(String::from))
        .ok_or("missing id")?;

    Ok(OAuthProfile {
        id,
        email: v["email"].as_str().map(String::from),
        name: v["name"]
            .as_str()
            .or_else(|| v["login"].as_str())
            .map(String::from),
        image: v["avatar_url"].as_str().map(String::from),
        // The user endpoint says nothing about verification; see the emails endpoint
        email_verified: false,
    })
}

fn map_google_profile(v: &Value) -> Result<OAuthProfile, String> {
    Ok(OAuthProfile {
        id: v["sub"].as_str().ok_or("missing sub")?.to_string(),
        email: v["email"].as_str().map(String::from),
        name: v["name"].as_str().map(String::from),
        image: v["picture"].as_str().map(String::from),
        email_verified: v["email_verified"].as_bool().unwrap_or(false),
    })
}

/// Picks the primary address from GitHub's `/user/emails` response
///
/// Returns the address and whether GitHub has verified it.
pub fn primary_github_email(v: &Value) -> Option<(String, bool)> {
    let emails = v.as_array()?;
    let primary = emails
        .iter()
        .find(|e| e["primary"].as_bool() == Some(true))
        .or_else(|| emails.first())?;

    Some((
        primary["email"].as_str()?.to_string(),
        primary["verified"].as_bool().unwrap_or(false),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_github_profile_mapping() {
        let provider = OAuthProvider::github("id", "secret");
        let profile = (provider.map_profile)(&json!({
            "id": 583231,
            "login": "octocat",
            "name": null,
            "email": "octocat@github.com",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231"
        }))
        .unwrap();

        assert_eq!(profile.id, "583231");
        assert_eq!(profile.name.as_deref(), Some("octocat"));
        assert_eq!(profile.email.as_deref(), Some("octocat@github.com"));
        assert!(!profile.email_verified);
    }

    #[test]
    fn test_google_profile_mapping() {
        let provider = OAuthProvider::google("id", "secret");
        let profile = (provider.map_profile)(&json!({
            "sub": "1098",
            "email": "kai@gmail.com",
            "email_verified": true,
            "name": "Kai",
            "picture": "https://lh3.googleusercontent.com/a/x"
        }))
        .unwrap();

        assert_eq!(profile.id, "1098");
        assert!(profile.email_verified);

        assert!((provider.map_profile)(&json!({ "email": "x@y.z" })).is_err());
    }

    #[test]
    fn test_primary_github_email() {
        let emails = json!([
            { "email": "old@example.com", "primary": false, "verified": true },
            { "email": "main@example.com", "primary": true, "verified": true }
        ]);
        assert_eq!(
            primary_github_email(&emails),
            Some(("main@example.com".to_string(), true))
        );
        assert!(primary_github_email(&json!([])).is_none());
    }

    #[test]
    fn test_authorization_url() {
        let provider = OAuthProvider::github("client-1", "secret");
        let url = provider.authorization_url(
            "http://localhost:3000/api/auth/callback/github",
            "nonce",
            "challenge",
        );

        assert!(url.starts_with("https://github.com/login/oauth/authorize?client_id=client-1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback%2Fgithub"));
        assert!(url.contains("scope=read%3Auser%20user%3Aemail"));
        assert!(url.contains("state=nonce"));
        assert!(url.contains("code_challenge_method=S256"));
    }
}
