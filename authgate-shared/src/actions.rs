/// Form actions: register, login, logout
///
/// Actions never fail with an error. Every outcome is an [`ActionResult`]
/// carrying a user-facing message, so forms can render it directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::adapter::{AdapterError, AuthAdapter};
use crate::auth::credentials::authorize;
use crate::auth::password::{hash_password, PasswordAlgorithm};
use crate::auth::session::{IssuedSession, SessionError, SessionManager};
use crate::data;
use crate::models::user::CreateUser;
use crate::routes::RouteTable;
use crate::schemas::{parse_form, SignInForm, SignUpForm};

pub const INVALID_FIELDS: &str = "Invalid fields!";
pub const EMAIL_IN_USE: &str = "Email already in use!";
pub const USER_CREATED: &str = "User created!";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials!";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong!";
pub const SIGNED_IN: &str = "Signed in!";

/// Outcome of a form action; exactly one field is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success(message: &str) -> Self {
        Self {
            success: Some(message.to_string()),
            error: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: None,
            error: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success.is_some()
    }
}

/// Result of a login attempt
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub result: ActionResult,

    /// Set on success
    pub session: Option<IssuedSession>,

    /// Where to send the user on success
    pub redirect_to: Option<String>,
}

impl LoginOutcome {
    fn failed(message: &str) -> Self {
        Self {
            result: ActionResult::error(message),
            session: None,
            redirect_to: None,
        }
    }
}

/// Creates a credentials user
pub async fn register(
    adapter: &dyn AuthAdapter,
    form: Value,
    algorithm: PasswordAlgorithm,
) -> ActionResult {
    let Ok(form) = parse_form::<SignUpForm>(form) else {
        return ActionResult::error(INVALID_FIELDS);
    };

    if data::get_user_by_email(adapter, &form.email).await.is_some() {
        return ActionResult::error(EMAIL_IN_USE);
    }

    let password_hash = match hash_password(&form.password, algorithm).await {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return ActionResult::error(SOMETHING_WENT_WRONG);
        }
    };

    let created = adapter
        .create_user(CreateUser {
            username: form.username,
            email: form.email,
            password_hash: Some(password_hash),
            ..Default::default()
        })
        .await;

    match created {
        Ok(user) => {
            info!(user_id = %user.id, "User registered");
            ActionResult::success(USER_CREATED)
        }
        // Lost a race with a concurrent registration
        Err(AdapterError::DuplicateEmail) => ActionResult::error(EMAIL_IN_USE),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            ActionResult::error(SOMETHING_WENT_WRONG)
        }
    }
}

/// Signs in with email and password, issuing a session on success
pub async fn login(manager: &SessionManager, routes: &RouteTable, form: Value) -> LoginOutcome {
    let Ok(parsed) = parse_form::<SignInForm>(form.clone()) else {
        return LoginOutcome::failed(INVALID_FIELDS);
    };

    let user = match authorize(manager.adapter().as_ref(), form).await {
        Ok(Some(user)) => user,
        Ok(None) => return LoginOutcome::failed(INVALID_CREDENTIALS),
        Err(e) => {
            error!(error = %e, "Credential check failed");
            return LoginOutcome::failed(SOMETHING_WENT_WRONG);
        }
    };

    let session = match manager.create_session(&user).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "Failed to create session");
            return LoginOutcome::failed(SOMETHING_WENT_WRONG);
        }
    };

    LoginOutcome {
        result: ActionResult::success(SIGNED_IN),
        session: Some(session),
        redirect_to: Some(routes.post_login_redirect(parsed.callback_url.as_deref())),
    }
}

/// Ends the session identified by `token`
pub async fn logout(manager: &SessionManager, token: &str) -> Result<(), SessionError> {
    manager.revoke(token).await?;
    info!("User signed out");
    Ok(())
}
