/// Persistence adapter
///
/// The auth logic (credentials, sessions, OAuth, actions) talks to storage
/// only through [`AuthAdapter`]. Two implementations ship with the crate:
///
/// - [`PgAdapter`]: PostgreSQL via sqlx, delegating to the `models` layer
/// - [`MemoryAdapter`]: in-process maps, used by tests and by local runs
///   without `DATABASE_URL`
///
/// Both enforce the same constraints the SQL schema declares: unique email,
/// unique `(provider, provider_account_id)`, cascade delete of accounts and
/// sessions with their user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    account::{Account, AccountTokens, CreateAccount},
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryAdapter;
pub use postgres::PgAdapter;

/// Error type for adapter operations
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Another user already has this email
    #[error("Email already in use")]
    DuplicateEmail,

    /// The provider identity is already linked to a user
    #[error("Account already linked")]
    DuplicateAccount,

    /// The referenced record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for AdapterError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AdapterError::NotFound("row".to_string()),
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some(constraint) if constraint.contains("email") => AdapterError::DuplicateEmail,
                Some(constraint) if constraint.contains("provider") => {
                    AdapterError::DuplicateAccount
                }
                Some(constraint) if constraint.contains("user_id_fkey") => {
                    AdapterError::NotFound("user".to_string())
                }
                _ => AdapterError::Database(db_err.to_string()),
            },
            other => AdapterError::Database(other.to_string()),
        }
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Storage operations needed by the auth flows
#[async_trait]
pub trait AuthAdapter: Send + Sync + 'static {
    // Users
    async fn create_user(&self, data: CreateUser) -> AdapterResult<User>;
    async fn get_user_by_id(&self, id: Uuid) -> AdapterResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<User>>;
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> AdapterResult<User>;
    async fn delete_user(&self, id: Uuid) -> AdapterResult<bool>;

    // Accounts
    async fn link_account(&self, data: CreateAccount) -> AdapterResult<Account>;
    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<User>>;
    async fn update_account_tokens(
        &self,
        provider: &str,
        provider_account_id: &str,
        tokens: AccountTokens,
    ) -> AdapterResult<bool>;
    async fn unlink_account(&self, provider: &str, provider_account_id: &str)
        -> AdapterResult<bool>;

    // Sessions
    async fn create_session(&self, data: CreateSession) -> AdapterResult<Session>;
    async fn get_session_and_user(
        &self,
        token_hash: &str,
    ) -> AdapterResult<Option<(Session, User)>>;
    async fn update_session_expiry(
        &self,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> AdapterResult<bool>;
    async fn delete_session(&self, token_hash: &str) -> AdapterResult<bool>;
    async fn delete_expired_sessions(&self) -> AdapterResult<u64>;

    /// Verifies the backing store is reachable
    async fn health_check(&self) -> AdapterResult<()>;

    /// Short name of the backing store, reported by `/health`
    fn backend_name(&self) -> &'static str;
}
