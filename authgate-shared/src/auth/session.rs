/// Session management
///
/// A session ties a browser (or API client) to a signed-in user. Two
/// strategies are supported:
///
/// - **Database**: the cookie holds 32 random bytes (hex). Only the SHA-256
///   of the token is stored; resolving a session is a lookup. Sessions slide:
///   once `update_age` has passed since the last extension, the expiry is
///   pushed to `now + max_age`.
/// - **Jwt**: the cookie holds an HS256 token carrying the user's identity.
///   Nothing is stored; revocation is not possible before expiry.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use authgate_shared::adapter::MemoryAdapter;
/// use authgate_shared::auth::session::{SessionConfig, SessionManager};
/// # use authgate_shared::models::user::User;
///
/// # async fn example(user: User) -> Result<(), Box<dyn std::error::Error>> {
/// let manager = SessionManager::new(
///     Arc::new(MemoryAdapter::new()),
///     SessionConfig::new("a-secret-that-is-at-least-32-bytes-long"),
/// );
///
/// let issued = manager.create_session(&user).await?;
/// let session = manager.resolve(&issued.token).await?;
/// assert!(session.is_some());
/// # Ok(())
/// # }
/// ```

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use super::cookies;
use crate::adapter::{AdapterError, AuthAdapter};
use crate::models::{session::CreateSession, user::User};

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "authgate.session-token";

/// `iss` claim of session JWTs
pub const JWT_ISSUER: &str = "authgate";

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Failed to sign a session token
    #[error("Failed to create session token: {0}")]
    Token(String),
}

/// How sessions are tracked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStrategy {
    #[default]
    Database,
    Jwt,
}

impl FromStr for SessionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "database" => Ok(SessionStrategy::Database),
            "jwt" => Ok(SessionStrategy::Jwt),
            other => Err(format!("Unknown session strategy: {}", other)),
        }
    }
}

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub strategy: SessionStrategy,

    /// Lifetime of a session (default 30 days)
    pub max_age: Duration,

    /// How often a database session's expiry is extended (default 24 hours)
    pub update_age: Duration,

    pub cookie_name: String,

    /// Adds `Secure` to the cookie (enable behind HTTPS)
    pub cookie_secure: bool,

    /// HS256 signing secret for the JWT strategy
    pub secret: String,
}

impl SessionConfig {
    /// Default settings with the given signing secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            strategy: SessionStrategy::default(),
            max_age: Duration::days(30),
            update_age: Duration::hours(24),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            secret: secret.into(),
        }
    }
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Value to put in the cookie
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// The user as seen through a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.username.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        }
    }
}

/// A resolved, valid session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

/// Claims of a session JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Generates a random session token (64 hex chars)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hex digest of a session token, the form stored in the database
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issues, resolves and revokes sessions
pub struct SessionManager {
    adapter: Arc<dyn AuthAdapter>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(adapter: Arc<dyn AuthAdapter>, config: SessionConfig) -> Self {
        Self { adapter, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn adapter(&self) -> &Arc<dyn AuthAdapter> {
        &self.adapter
    }

    /// Issues a new session for `user`
    pub async fn create_session(&self, user: &User) -> Result<IssuedSession, SessionError> {
        let now = Utc::now();
        let expires = now + self.config.max_age;

        let token = match self.config.strategy {
            SessionStrategy::Database => {
                let token = generate_session_token();
                self.adapter
                    .create_session(CreateSession {
                        session_token_hash: hash_session_token(&token),
                        user_id: user.id,
                        expires,
                    })
                    .await?;
                token
            }
            SessionStrategy::Jwt => {
                let claims = SessionClaims {
                    sub: user.id,
                    email: user.email.clone(),
                    name: user.username.clone(),
                    picture: user.image.clone(),
                    iss: JWT_ISSUER.to_string(),
                    iat: now.timestamp(),
                    exp: expires.timestamp(),
                };
                encode(
                    &Header::new(Algorithm::HS256),
                    &claims,
                    &EncodingKey::from_secret(self.config.secret.as_bytes()),
                )
                .map_err(|e| SessionError::Token(e.to_string()))?
            }
        };

        info!(user_id = %user.id, strategy = ?self.config.strategy, "Session created");
        Ok(IssuedSession { token, expires })
    }

    /// Resolves a session token to the signed-in user
    ///
    /// Returns `None` for unknown, expired or tampered tokens. Expired
    /// database sessions are deleted on sight.
    pub async fn resolve(&self, token: &str) -> Result<Option<SessionData>, SessionError> {
        match self.config.strategy {
            SessionStrategy::Database => self.resolve_database(token).await,
            SessionStrategy::Jwt => Ok(self.resolve_jwt(token)),
        }
    }

    async fn resolve_database(&self, token: &str) -> Result<Option<SessionData>, SessionError> {
        let token_hash = hash_session_token(token);
        let Some((session, user)) = self.adapter.get_session_and_user(&token_hash).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.is_expired_at(now) {
            debug!(user_id = %user.id, "Session expired, deleting");
            self.adapter.delete_session(&token_hash).await?;
            return Ok(None);
        }

        let mut expires = session.expires;
        let due_for_update = session.expires - self.config.max_age + self.config.update_age;
        if due_for_update <= now {
            expires = now + self.config.max_age;
            self.adapter
                .update_session_expiry(&token_hash, expires)
                .await?;
            debug!(user_id = %user.id, %expires, "Session extended");
        }

        Ok(Some(SessionData {
            user: SessionUser::from(&user),
            expires,
        }))
    }

    fn resolve_jwt(&self, token: &str) -> Option<SessionData> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[JWT_ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        // Expire exactly at `exp`, like database sessions
        validation.leeway = 0;

        let data = match decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                return None;
            }
        };

        let claims = data.claims;
        let expires = Utc.timestamp_opt(claims.exp, 0).single()?;

        Some(SessionData {
            user: SessionUser {
                id: claims.sub,
                name: claims.name,
                email: claims.email,
                image: claims.picture,
            },
            expires,
        })
    }

    /// Ends a session
    ///
    /// Database sessions are deleted; JWT sessions can only be dropped by
    /// clearing the cookie.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        if self.config.strategy == SessionStrategy::Database {
            let deleted = self
                .adapter
                .delete_session(&hash_session_token(token))
                .await?;
            debug!(deleted, "Session revoked");
        }
        Ok(())
    }

    /// `Set-Cookie` value carrying an issued session
    pub fn session_cookie(&self, issued: &IssuedSession) -> String {
        let max_age = (issued.expires - Utc::now()).num_seconds();
        cookies::build_cookie(
            &self.config.cookie_name,
            &issued.token,
            max_age,
            self.config.cookie_secure,
        )
    }

    /// `Set-Cookie` value removing the session cookie
    pub fn clear_cookie(&self) -> String {
        cookies::clear_cookie(&self.config.cookie_name, self.config.cookie_secure)
    }

    /// Reads the session token from a raw `Cookie` header
    pub fn token_from_cookie_header(&self, header: &str) -> Option<String> {
        cookies::read_cookie(header, &self.config.cookie_name)
    }
}
