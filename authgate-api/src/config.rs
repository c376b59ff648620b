/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PRODUCTION`: Enables `Secure` cookies and HSTS (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: any)
/// - `DATABASE_URL`: PostgreSQL connection string (absent: in-memory storage)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `AUTH_SECRET`: Secret for signing session JWTs and OAuth state (required)
/// - `AUTH_SESSION_STRATEGY`: `database` or `jwt` (default: database)
/// - `AUTH_SESSION_MAX_AGE_SECS`: Session lifetime (default: 30 days)
/// - `AUTH_PASSWORD_ALGORITHM`: `bcrypt` or `argon2` (default: bcrypt)
/// - `AUTH_URL`: Public base URL, used for OAuth callbacks
/// - `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET`
/// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`
///
/// # Example
///
/// ```no_run
/// use authgate_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use authgate_shared::auth::oauth::{OAuthProvider, OAuthRegistry};
use authgate_shared::auth::password::PasswordAlgorithm;
use authgate_shared::auth::session::{SessionConfig, SessionStrategy};
use authgate_shared::db::pool;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration; `None` runs on in-memory storage
    pub database: Option<DatabaseConfig>,

    /// Session and password settings
    pub auth: AuthConfig,

    /// OAuth provider credentials
    pub oauth: OAuthConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode
    pub production: bool,

    /// Allowed CORS origins (empty: any)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Signing secret
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    pub session_strategy: SessionStrategy,

    pub session_max_age_secs: i64,

    pub password_algorithm: PasswordAlgorithm,

    /// Public base URL (e.g. `https://auth.example.com`)
    pub base_url: String,
}

/// Client credentials of one OAuth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,

    #[serde(skip_serializing)]
    pub client_secret: String,
}

/// OAuth providers; a provider is enabled when both its ID and secret are set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub github: Option<ProviderCredentials>,
    pub google: Option<ProviderCredentials>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `AUTH_SECRET` is missing or shorter than 32 characters
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()?;
        let production = var("API_PRODUCTION")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let cors_origins = var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let database = match var("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse::<u32>()?,
            }),
            None => None,
        };

        let secret = var("AUTH_SECRET")
            .ok_or_else(|| anyhow::anyhow!("AUTH_SECRET environment variable is required"))?;
        if secret.len() < 32 {
            anyhow::bail!("AUTH_SECRET must be at least 32 characters long");
        }

        let session_strategy = match var("AUTH_SESSION_STRATEGY") {
            Some(v) => v.parse::<SessionStrategy>().map_err(anyhow::Error::msg)?,
            None => SessionStrategy::default(),
        };
        let session_max_age_secs = match var("AUTH_SESSION_MAX_AGE_SECS") {
            Some(v) => v.parse::<i64>()?,
            None => DEFAULT_SESSION_MAX_AGE_SECS,
        };
        if session_max_age_secs <= 0 {
            anyhow::bail!("AUTH_SESSION_MAX_AGE_SECS must be positive");
        }
        let password_algorithm = match var("AUTH_PASSWORD_ALGORITHM") {
            Some(v) => v.parse::<PasswordAlgorithm>().map_err(anyhow::Error::msg)?,
            None => PasswordAlgorithm::default(),
        };
        let base_url = var("AUTH_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let credentials = |id_key: &str, secret_key: &str| {
            Some(ProviderCredentials {
                client_id: var(id_key)?,
                client_secret: var(secret_key)?,
            })
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            database,
            auth: AuthConfig {
                secret,
                session_strategy,
                session_max_age_secs,
                password_algorithm,
                base_url,
            },
            oauth: OAuthConfig {
                github: credentials("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
                google: credentials("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Session settings derived from this configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            strategy: self.auth.session_strategy,
            max_age: Duration::seconds(self.auth.session_max_age_secs),
            cookie_secure: self.api.production,
            ..SessionConfig::new(self.auth.secret.clone())
        }
    }

    /// Pool settings, if a database is configured
    pub fn pool_config(&self) -> Option<pool::DatabaseConfig> {
        self.database.as_ref().map(|db| pool::DatabaseConfig {
            max_connections: db.max_connections,
            ..pool::DatabaseConfig::new(db.url.clone())
        })
    }

    /// The enabled OAuth providers
    pub fn oauth_registry(&self) -> OAuthRegistry {
        let mut registry = OAuthRegistry::new();
        if let Some(c) = &self.oauth.github {
            registry = registry.with(OAuthProvider::github(&c.client_id, &c.client_secret));
        }
        if let Some(c) = &self.oauth.google {
            registry = registry.with(OAuthProvider::google(&c.client_id, &c.client_secret));
        }
        registry
    }

    /// Callback URL registered with a provider
    pub fn oauth_callback_url(&self, provider: &str) -> String {
        format!("{}/api/auth/callback/{}", self.auth.base_url, provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("AUTH_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.database.is_none());
        assert!(!config.api.production);
        assert_eq!(config.auth.session_strategy, SessionStrategy::Database);
        assert_eq!(config.auth.password_algorithm, PasswordAlgorithm::Bcrypt);
        assert_eq!(config.auth.base_url, "http://localhost:8080");
        assert!(config.oauth_registry().is_empty());
    }

    #[test]
    fn test_secret_is_required_and_long() {
        assert!(load(&[]).is_err());
        assert!(load(&[("AUTH_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_full_configuration() {
        let config = load(&[
            ("AUTH_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("API_PRODUCTION", "true"),
            ("CORS_ORIGINS", "https://a.example.com, https://b.example.com"),
            ("DATABASE_URL", "postgresql://localhost/authgate"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("AUTH_SESSION_STRATEGY", "jwt"),
            ("AUTH_SESSION_MAX_AGE_SECS", "3600"),
            ("AUTH_PASSWORD_ALGORITHM", "argon2"),
            ("AUTH_URL", "https://auth.example.com/"),
            ("GITHUB_CLIENT_ID", "gh-id"),
            ("GITHUB_CLIENT_SECRET", "gh-secret"),
            ("GOOGLE_CLIENT_ID", "only-id"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.api.cors_origins.len(), 2);
        assert_eq!(config.pool_config().unwrap().max_connections, 4);

        let session = config.session_config();
        assert_eq!(session.strategy, SessionStrategy::Jwt);
        assert_eq!(session.max_age, Duration::hours(1));
        assert!(session.cookie_secure);

        assert_eq!(config.auth.password_algorithm, PasswordAlgorithm::Argon2);
        assert_eq!(
            config.oauth_callback_url("github"),
            "https://auth.example.com/api/auth/callback/github"
        );

        // Google lacks a secret, so only GitHub is enabled
        let ids: Vec<String> = config.oauth_registry().providers().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["github".to_string()]);
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("AUTH_SECRET", SECRET), ("API_PORT", "http")]).is_err());
        assert!(load(&[("AUTH_SECRET", SECRET), ("AUTH_SESSION_STRATEGY", "cookie")]).is_err());
        assert!(load(&[("AUTH_SECRET", SECRET), ("AUTH_SESSION_MAX_AGE_SECS", "0")]).is_err());
    }
}
