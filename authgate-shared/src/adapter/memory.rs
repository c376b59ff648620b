/// In-memory adapter
///
/// Keeps users, accounts and sessions in maps behind a single `RwLock`.
/// Email comparison is case-insensitive to match the CITEXT column.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AdapterError, AdapterResult, AuthAdapter};
use crate::models::{
    account::{Account, AccountTokens, CreateAccount},
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

#[derive(Debug, Default)]
struct Store {
    users: HashMap<Uuid, User>,
    accounts: HashMap<(String, String), Account>,
    sessions: HashMap<String, Session>,
}

impl Store {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

/// [`AuthAdapter`] that stores everything in process memory
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    store: RwLock<Store>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.store.read().await.users.len()
    }

    /// Number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.store.read().await.sessions.len()
    }

    /// Number of linked accounts
    pub async fn account_count(&self) -> usize {
        self.store.read().await.accounts.len()
    }
}

#[async_trait]
impl AuthAdapter for MemoryAdapter {
    async fn create_user(&self, data: CreateUser) -> AdapterResult<User> {
        let mut store = self.store.write().await;
        if store.email_taken(&data.email, None) {
            return Err(AdapterError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            email_verified: data.email_verified,
            image: data.image,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> AdapterResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> AdapterResult<User> {
        let mut store = self.store.write().await;
        if let Some(email) = data.email.as_deref() {
            if store.email_taken(email, Some(id)) {
                return Err(AdapterError::DuplicateEmail);
            }
        }

        let user = store
            .users
            .get_mut(&id)
            .ok_or_else(|| AdapterError::NotFound(format!("user {}", id)))?;
        data.apply_to(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> AdapterResult<bool> {
        let mut store = self.store.write().await;
        if store.users.remove(&id).is_none() {
            return Ok(false);
        }

        // ON DELETE CASCADE
        store.accounts.retain(|_, a| a.user_id != id);
        store.sessions.retain(|_, s| s.user_id != id);
        Ok(true)
    }

    async fn link_account(&self, data: CreateAccount) -> AdapterResult<Account> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&data.user_id) {
            return Err(AdapterError::NotFound(format!("user {}", data.user_id)));
        }

        let key = (data.provider.clone(), data.provider_account_id.clone());
        if store.accounts.contains_key(&key) {
            return Err(AdapterError::DuplicateAccount);
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            account_type: data.account_type,
            provider: data.provider,
            provider_account_id: data.provider_account_id,
            refresh_token: data.tokens.refresh_token,
            access_token: data.tokens.access_token,
            expires_at: data.tokens.expires_at,
            token_type: data.tokens.token_type,
            scope: data.tokens.scope,
            id_token: data.tokens.id_token,
            session_state: data.tokens.session_state,
            created_at: now,
            updated_at: now,
        };
        store.accounts.insert(key, account.clone());
        Ok(account)
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<User>> {
        let store = self.store.read().await;
        let key = (provider.to_string(), provider_account_id.to_string());
        Ok(store
            .accounts
            .get(&key)
            .and_then(|a| store.users.get(&a.user_id))
            .cloned())
    }

    async fn update_account_tokens(
        &self,
        provider: &str,
        provider_account_id: &str,
        tokens: AccountTokens,
    ) -> AdapterResult<bool> {
        let mut store = self.store.write().await;
        let key = (provider.to_string(), provider_account_id.to_string());
        let Some(account) = store.accounts.get_mut(&key) else {
            return Ok(false);
        };

        if tokens.refresh_token.is_some() {
            account.refresh_token = tokens.refresh_token;
        }
        account.access_token = tokens.access_token;
        account.expires_at = tokens.expires_at;
        account.token_type = tokens.token_type;
        account.scope = tokens.scope;
        account.id_token = tokens.id_token;
        account.session_state = tokens.session_state;
        account.updated_at = Utc::now();
        Ok(true)
    }

    async fn unlink_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<bool> {
        let mut store = self.store.write().await;
        let key = (provider.to_string(), provider_account_id.to_string());
        Ok(store.accounts.remove(&key).is_some())
    }

    async fn create_session(&self, data: CreateSession) -> AdapterResult<Session> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&data.user_id) {
            return Err(AdapterError::NotFound(format!("user {}", data.user_id)));
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            session_token_hash: data.session_token_hash,
            user_id: data.user_id,
            expires: data.expires,
            created_at: now,
            updated_at: now,
        };
        store
            .sessions
            .insert(session.session_token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn get_session_and_user(
        &self,
        token_hash: &str,
    ) -> AdapterResult<Option<(Session, User)>> {
        let store = self.store.read().await;
        Ok(store.sessions.get(token_hash).and_then(|session| {
            store
                .users
                .get(&session.user_id)
                .map(|user| (session.clone(), user.clone()))
        }))
    }

    async fn update_session_expiry(
        &self,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> AdapterResult<bool> {
        let mut store = self.store.write().await;
        let Some(session) = store.sessions.get_mut(token_hash) else {
            return Ok(false);
        };
        session.expires = expires;
        session.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_session(&self, token_hash: &str) -> AdapterResult<bool> {
        Ok(self.store.write().await.sessions.remove(token_hash).is_some())
    }

    async fn delete_expired_sessions(&self) -> AdapterResult<u64> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let before = store.sessions.len();
        store.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - store.sessions.len()) as u64)
    }

    async fn health_check(&self) -> AdapterResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
