/// PostgreSQL adapter
///
/// Thin bridge from [`AuthAdapter`] to the sqlx model functions. Constraint
/// violations are translated into typed [`AdapterError`] variants by the
/// `From<sqlx::Error>` conversion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AdapterError, AdapterResult, AuthAdapter};
use crate::db::pool;
use crate::models::{
    account::{Account, AccountTokens, CreateAccount},
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

/// [`AuthAdapter`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuthAdapter for PgAdapter {
    async fn create_user(&self, data: CreateUser) -> AdapterResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn get_user_by_id(&self, id: Uuid) -> AdapterResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> AdapterResult<User> {
        User::update(&self.pool, id, data)
            .await?
            .ok_or_else(|| AdapterError::NotFound(format!("user {}", id)))
    }

    async fn delete_user(&self, id: Uuid) -> AdapterResult<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn link_account(&self, data: CreateAccount) -> AdapterResult<Account> {
        Ok(Account::create(&self.pool, data).await?)
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<User>> {
        Ok(Account::find_user(&self.pool, provider, provider_account_id).await?)
    }

    async fn update_account_tokens(
        &self,
        provider: &str,
        provider_account_id: &str,
        tokens: AccountTokens,
    ) -> AdapterResult<bool> {
        Ok(Account::update_tokens(&self.pool, provider, provider_account_id, tokens).await?)
    }

    async fn unlink_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<bool> {
        Ok(Account::delete_by_provider(&self.pool, provider, provider_account_id).await?)
    }

    async fn create_session(&self, data: CreateSession) -> AdapterResult<Session> {
        Ok(Session::create(&self.pool, data).await?)
    }

    async fn get_session_and_user(
        &self,
        token_hash: &str,
    ) -> AdapterResult<Option<(Session, User)>> {
        let Some(session) = Session::find_by_token_hash(&self.pool, token_hash).await? else {
            return Ok(None);
        };

        let user = User::find_by_id(&self.pool, session.user_id).await?;
        Ok(user.map(|user| (session, user)))
    }

    async fn update_session_expiry(
        &self,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> AdapterResult<bool> {
        Ok(Session::update_expiry(&self.pool, token_hash, expires).await?)
    }

    async fn delete_session(&self, token_hash: &str) -> AdapterResult<bool> {
        Ok(Session::delete_by_token_hash(&self.pool, token_hash).await?)
    }

    async fn delete_expired_sessions(&self) -> AdapterResult<u64> {
        Ok(Session::delete_expired(&self.pool).await?)
    }

    async fn health_check(&self) -> AdapterResult<()> {
        Ok(pool::health_check(&self.pool).await?)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
