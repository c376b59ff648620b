/// OAuth account model
///
/// An account links a user to an identity at an OAuth provider. A user may
/// have several accounts (one per provider); a provider identity belongs to
/// exactly one user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     account_type VARCHAR(32) NOT NULL,
///     provider VARCHAR(64) NOT NULL,
///     provider_account_id VARCHAR(255) NOT NULL,
///     refresh_token TEXT,
///     access_token TEXT,
///     expires_at BIGINT,
///     token_type VARCHAR(64),
///     scope TEXT,
///     id_token TEXT,
///     session_state TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (provider, provider_account_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;

const ACCOUNT_COLUMNS: &str = "id, user_id, account_type, provider, provider_account_id, \
     refresh_token, access_token, expires_at, token_type, scope, id_token, session_state, \
     created_at, updated_at";

/// Linked provider account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Always `"oauth"` for accounts created by the OAuth flow
    pub account_type: String,

    /// Provider ID (`"github"`, `"google"`)
    pub provider: String,

    /// The user's ID at the provider
    pub provider_account_id: String,

    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Access token expiry (unix seconds)
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    #[serde(skip_serializing)]
    pub id_token: Option<String>,
    pub session_state: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tokens returned by a provider's token endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub session_state: Option<String>,
}

/// Input for linking a provider account to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub user_id: Uuid,
    pub account_type: String,
    pub provider: String,
    pub provider_account_id: String,
    pub tokens: AccountTokens,
}

impl Account {
    /// Links a provider account to a user
    ///
    /// # Errors
    ///
    /// Fails on `accounts_provider_account_key` when the provider identity is
    /// already linked, or on the foreign key when the user doesn't exist.
    pub async fn create(pool: &PgPool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (user_id, account_type, provider, provider_account_id, \
             refresh_token, access_token, expires_at, token_type, scope, id_token, session_state) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {ACCOUNT_COLUMNS}"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(data.user_id)
            .bind(data.account_type)
            .bind(data.provider)
            .bind(data.provider_account_id)
            .bind(data.tokens.refresh_token)
            .bind(data.tokens.access_token)
            .bind(data.tokens.expires_at)
            .bind(data.tokens.token_type)
            .bind(data.tokens.scope)
            .bind(data.tokens.id_token)
            .bind(data.tokens.session_state)
            .fetch_one(pool)
            .await
    }

    /// Finds the account for a provider identity
    pub async fn find_by_provider(
        pool: &PgPool,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE provider = $1 AND provider_account_id = $2"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(provider)
            .bind(provider_account_id)
            .fetch_optional(pool)
            .await
    }

    /// Finds the user that owns a provider identity
    pub async fn find_user(
        pool: &PgPool,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.email_verified, u.image, u.password_hash,
                   u.created_at, u.updated_at
            FROM accounts a
            JOIN users u ON u.id = a.user_id
            WHERE a.provider = $1 AND a.provider_account_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all accounts linked to a user
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1 ORDER BY created_at"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Replaces the stored provider tokens after a repeat sign-in
    pub async fn update_tokens(
        pool: &PgPool,
        provider: &str,
        provider_account_id: &str,
        tokens: AccountTokens,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token = COALESCE($3, refresh_token),
                access_token = $4,
                expires_at = $5,
                token_type = $6,
                scope = $7,
                id_token = $8,
                session_state = $9,
                updated_at = NOW()
            WHERE provider = $1 AND provider_account_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_account_id)
        .bind(tokens.refresh_token)
        .bind(tokens.access_token)
        .bind(tokens.expires_at)
        .bind(tokens.token_type)
        .bind(tokens.scope)
        .bind(tokens.id_token)
        .bind(tokens.session_state)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unlinks a provider identity
    pub async fn delete_by_provider(
        pool: &PgPool,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM accounts WHERE provider = $1 AND provider_account_id = $2")
                .bind(provider)
                .bind(provider_account_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
