/// Turning a provider profile into a local user.

use chrono::Utc;
use tracing::{info, warn};

use super::client::OAuthTokens;
use super::provider::OAuthProfile;
use super::OAuthError;
use crate::adapter::AuthAdapter;
use crate::models::account::CreateAccount;
use crate::models::user::{CreateUser, User};

/// Signs in (or up) with an OAuth profile
///
/// - Account already linked: its user is returned and the stored tokens are
///   refreshed.
/// - Email already owned by another user: [`OAuthError::AccountNotLinked`].
///   Accounts are never linked automatically by email.
/// - Otherwise a new user is created (verified when the provider says so) and
///   the account is linked to it.
pub async fn sign_in_with_profile(
    adapter: &dyn AuthAdapter,
    provider: &str,
    profile: &OAuthProfile,
    tokens: &OAuthTokens,
) -> Result<User, OAuthError> {
    if let Some(user) = adapter.get_user_by_account(provider, &profile.id).await? {
        adapter
            .update_account_tokens(provider, &profile.id, tokens.to_account_tokens())
            .await?;
        info!(user_id = %user.id, provider, "OAuth sign-in");
        return Ok(user);
    }

    let email = profile.email.as_deref().ok_or(OAuthError::MissingEmail)?;

    if adapter.get_user_by_email(email).await?.is_some() {
        warn!(provider, "OAuth email belongs to an existing user");
        return Err(OAuthError::AccountNotLinked);
    }

    let user = adapter
        .create_user(CreateUser {
            username: profile.name.clone(),
            email: email.to_string(),
            email_verified: profile.email_verified.then(Utc::now),
            image: profile.image.clone(),
            password_hash: None,
        })
        .await?;

    let linked = adapter
        .link_account(CreateAccount {
            user_id: user.id,
            account_type: "oauth".to_string(),
            provider: provider.to_string(),
            provider_account_id: profile.id.clone(),
            tokens: tokens.to_account_tokens(),
        })
        .await;

    if let Err(e) = linked {
        // Don't leave a user with no way to sign in
        adapter.delete_user(user.id).await?;
        return Err(e.into());
    }

    info!(user_id = %user.id, provider, "OAuth sign-up");
    Ok(user)
}
