/// Database-backed session model
///
/// Only the SHA-256 hex digest of the session token is stored, so a database
/// leak does not hand out usable cookies.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     session_token_hash CHAR(64) NOT NULL UNIQUE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expires TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, session_token_hash, user_id, expires, created_at, updated_at";

/// Persisted session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,

    #[serde(skip_serializing)]
    pub session_token_hash: String,

    pub user_id: Uuid,
    pub expires: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// Input for creating a session
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub session_token_hash: String,
    pub user_id: Uuid,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub async fn create(pool: &PgPool, data: CreateSession) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (session_token_hash, user_id, expires) \
             VALUES ($1, $2, $3) RETURNING {SESSION_COLUMNS}"
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(data.session_token_hash)
            .bind(data.user_id)
            .bind(data.expires)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_token_hash = $1");

        sqlx::query_as::<_, Session>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Moves the expiry of a session (sliding window)
    pub async fn update_expiry(
        pool: &PgPool,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET expires = $2, updated_at = NOW() WHERE session_token_hash = $1",
        )
        .bind(token_hash)
        .bind(expires)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_token_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every expired session, returning how many were deleted
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
