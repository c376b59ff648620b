/// Credentials (email + password) authorization
///
/// `authorize` answers one question: do these submitted credentials belong
/// to a user? It returns the user on a match and `None` otherwise. Invalid
/// input, unknown email, an OAuth-only user and a wrong password all look the
/// same to the caller.

use tracing::debug;

use super::password::{verify_password, PasswordError};
use crate::adapter::AuthAdapter;
use crate::data;
use crate::models::user::User;
use crate::schemas::{parse_form, SignInForm};

/// Checks submitted credentials against the stored password hash
///
/// # Errors
///
/// Only a malformed stored hash (or a failed hashing task) is an error; every
/// other failure returns `Ok(None)`.
pub async fn authorize(
    adapter: &dyn AuthAdapter,
    credentials: serde_json::Value,
) -> Result<Option<User>, PasswordError> {
    let Ok(form) = parse_form::<SignInForm>(credentials) else {
        debug!("Credentials failed validation");
        return Ok(None);
    };

    let Some(user) = data::get_user_by_email(adapter, &form.email).await else {
        debug!("No user for submitted email");
        return Ok(None);
    };

    let Some(hash) = user.password_hash.as_deref() else {
        debug!(user_id = %user.id, "User has no password (OAuth-only)");
        return Ok(None);
    };

    if verify_password(&form.password, hash).await? {
        Ok(Some(user))
    } else {
        debug!(user_id = %user.id, "Password mismatch");
        Ok(None)
    }
}
