/// Authentication
///
/// # Modules
///
/// - [`password`]: bcrypt / Argon2id hashing and verification
/// - [`credentials`]: email + password authorization
/// - [`session`]: database and JWT sessions
/// - [`cookies`]: `Set-Cookie` building and `Cookie` parsing
/// - [`oauth`]: GitHub and Google sign-in
///
/// # Example
///
/// ```no_run
/// use authgate_shared::auth::password::{hash_password, verify_password, PasswordAlgorithm};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password_long", PasswordAlgorithm::Bcrypt).await?;
/// assert!(verify_password("user_password_long", &hash).await?);
/// # Ok(())
/// # }
/// ```

pub mod cookies;
pub mod credentials;
pub mod oauth;
pub mod password;
pub mod session;
