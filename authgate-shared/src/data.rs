/// User lookup helpers
///
/// Storage errors are logged and swallowed: callers only care whether a user
/// was found, and a lookup failure is treated the same as "no such user".

use tracing::error;
use uuid::Uuid;

use crate::adapter::AuthAdapter;
use crate::models::user::User;

/// Finds a user by email, returning `None` on any storage error
pub async fn get_user_by_email(adapter: &dyn AuthAdapter, email: &str) -> Option<User> {
    match adapter.get_user_by_email(email).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Failed to look up user by email");
            None
        }
    }
}

/// Finds a user by ID, returning `None` on any storage error
pub async fn get_user_by_id(adapter: &dyn AuthAdapter, id: Uuid) -> Option<User> {
    match adapter.get_user_by_id(id).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, user_id = %id, "Failed to look up user by id");
            None
        }
    }
}
