/// Password hashing
///
/// New hashes are produced with the configured [`PasswordAlgorithm`]
/// (bcrypt by default, Argon2id optional). Verification detects the
/// algorithm from the stored hash, so switching the configured algorithm
/// never locks out existing users.
///
/// Both algorithms are CPU-bound and run on tokio's blocking pool.
///
/// # Example
///
/// ```
/// use authgate_shared::auth::password::{hash_password, verify_password, PasswordAlgorithm};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery", PasswordAlgorithm::Bcrypt).await?;
/// assert!(hash.starts_with("$2b$10$"));
///
/// assert!(verify_password("correct horse battery", &hash).await?);
/// assert!(!verify_password("wrong", &hash).await?);
/// # Ok(())
/// # }
/// ```

use std::str::FromStr;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use serde::{Deserialize, Serialize};

/// bcrypt work factor for new hashes
pub const BCRYPT_COST: u32 = 10;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a recognised bcrypt or Argon2 hash
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// The blocking task running the hash was cancelled or panicked
    #[error("Hashing task failed: {0}")]
    TaskError(String),
}

/// Algorithm used for new password hashes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordAlgorithm {
    #[default]
    Bcrypt,
    Argon2,
}

impl FromStr for PasswordAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(PasswordAlgorithm::Bcrypt),
            "argon2" | "argon2id" => Ok(PasswordAlgorithm::Argon2),
            other => Err(format!("Unknown password algorithm: {}", other)),
        }
    }
}

/// Hashes a password with the given algorithm
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub async fn hash_password(
    password: &str,
    algorithm: PasswordAlgorithm,
) -> Result<String, PasswordError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || match algorithm {
        PasswordAlgorithm::Bcrypt => bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| PasswordError::HashError(e.to_string())),
        PasswordAlgorithm::Argon2 => hash_argon2(&password),
    })
    .await
    .map_err(|e| PasswordError::TaskError(e.to_string()))?
}

/// Verifies a password against a stored hash
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash is malformed
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || {
        if hash.starts_with("$argon2") {
            verify_argon2(&password, &hash)
        } else if hash.starts_with("$2") {
            bcrypt::verify(password, &hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))
        } else {
            Err(PasswordError::InvalidHash(
                "unrecognised hash prefix".to_string(),
            ))
        }
    })
    .await
    .map_err(|e| PasswordError::TaskError(e.to_string()))?
}

/// Argon2id with 64 MB memory, 3 iterations, 4 lanes, 32-byte output
fn hash_argon2(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

fn verify_argon2(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are embedded in the hash
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bcrypt_hash_format() {
        let hash = hash_password("test_password_123", PasswordAlgorithm::Bcrypt)
            .await
            .expect("Hash should succeed");

        assert!(hash.starts_with("$2b$10$"));
        assert_eq!(hash.len(), 60);
    }

    #[tokio::test]
    async fn test_argon2_hash_format() {
        let hash = hash_password("test_password_123", PasswordAlgorithm::Argon2)
            .await
            .expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[tokio::test]
    async fn test_hash_produces_different_salts() {
        let hash1 = hash_password("same_password", PasswordAlgorithm::Bcrypt).await.unwrap();
        let hash2 = hash_password("same_password", PasswordAlgorithm::Bcrypt).await.unwrap();

        assert_ne!(hash1, hash2);
    }

    #[tokio::test]
    async fn test_verify_detects_algorithm() {
        for algorithm in [PasswordAlgorithm::Bcrypt, PasswordAlgorithm::Argon2] {
            let hash = hash_password("correct_password", algorithm).await.unwrap();

            assert!(verify_password("correct_password", &hash).await.unwrap());
            assert!(!verify_password("wrong_password", &hash).await.unwrap());
            assert!(!verify_password("", &hash).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").await.is_err());
        assert!(verify_password("password", "$argon2id$invalid").await.is_err());
        assert!(verify_password("password", "$2b$10$short").await.is_err());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("bcrypt".parse::<PasswordAlgorithm>(), Ok(PasswordAlgorithm::Bcrypt));
        assert_eq!("Argon2id".parse::<PasswordAlgorithm>(), Ok(PasswordAlgorithm::Argon2));
        assert!("md5".parse::<PasswordAlgorithm>().is_err());
        assert_eq!(PasswordAlgorithm::default(), PasswordAlgorithm::Bcrypt);
    }
}
