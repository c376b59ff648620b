/// User model and database operations
///
/// A user signs in either with email + password (credentials) or through a
/// linked OAuth account. OAuth-only users have no password hash.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(50),
///     email CITEXT NOT NULL UNIQUE,
///     email_verified TIMESTAMPTZ,
///     image VARCHAR(512),
///     password_hash VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use authgate_shared::models::user::{User, CreateUser};
/// use authgate_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: Some("$2b$10$...".to_string()),
///     ..Default::default()
/// }).await?;
///
/// let found = User::find_by_email(&pool, "USER@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, username, email, email_verified, image, password_hash, created_at, updated_at";

/// User model representing a user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Optional display name chosen at sign-up (or taken from the OAuth profile)
    pub username: Option<String>,

    /// Email address, unique and case-insensitive
    pub email: String,

    /// When the email address was verified (OAuth providers that assert a
    /// verified email set this on first sign-in)
    pub email_verified: Option<DateTime<Utc>>,

    /// Avatar URL
    pub image: Option<String>,

    /// bcrypt or Argon2id hash; `None` for OAuth-only users
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as exposed over the wire (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: String,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            email_verified: user.email_verified,
            image: user.image.clone(),
            created_at: user.created_at,
        }
    }
}

impl User {
    /// Whether this user can sign in with a password
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
    pub email: String,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,

    /// Already-hashed password (NOT plaintext!)
    pub password_hash: Option<String>,
}

/// Input for updating an existing user
///
/// All fields are optional. Only `Some` fields are written; the inner
/// `Option` allows clearing nullable columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub username: Option<Option<String>>,
    pub email: Option<String>,
    pub email_verified: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<String>>,
    pub password_hash: Option<Option<String>>,
}

impl UpdateUser {
    /// Applies the update to an in-memory user
    pub fn apply_to(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(email_verified) = self.email_verified {
            user.email_verified = email_verified;
        }
        if let Some(image) = self.image {
            user.image = image;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
    }
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (`users_email_key`
    /// unique constraint) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, email_verified, image, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.email)
            .bind(data.email_verified)
            .bind(data.image)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address, ignoring case
    ///
    /// The parameter is cast to CITEXT; a TEXT parameter would make Postgres
    /// compare the column as TEXT, which is case-sensitive.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1::citext");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only `Some` fields in `data` are written. `updated_at` is always bumped.
    ///
    /// # Returns
    ///
    /// The updated user, or `None` if no user has this ID
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.email_verified.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email_verified = ${}", bind_count));
        }
        if data.image.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(email_verified) = data.email_verified {
            q = q.bind(email_verified);
        }
        if let Some(image) = data.image {
            q = q.bind(image);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user by ID
    ///
    /// Linked accounts and sessions are removed by `ON DELETE CASCADE`.
    ///
    /// # Returns
    ///
    /// True if the user was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: Some("alice".to_string()),
            email: "alice@example.com".to_string(),
            email_verified: None,
            image: None,
            password_hash: Some("$2b$10$hash".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }

    #[test]
    fn test_public_user_projection() {
        let user = sample_user();
        let public = PublicUser::from(&user);
        assert_eq!(public.id, user.id);
        assert_eq!(public.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_update_user_apply_clears_nullable_fields() {
        let mut user = sample_user();
        let update = UpdateUser {
            username: Some(None),
            image: Some(Some("https://example.com/a.png".to_string())),
            ..Default::default()
        };

        update.apply_to(&mut user);

        assert!(user.username.is_none());
        assert_eq!(user.image.as_deref(), Some("https://example.com/a.png"));
        assert!(user.has_password());
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.username.is_none());
        assert!(update.image.is_none());
        assert!(update.email_verified.is_none());
    }
}
