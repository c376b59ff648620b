/// Database models for authgate
///
/// This module contains the persisted entities and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts (credentials and OAuth)
/// - `account`: OAuth provider linkage
/// - `session`: Database-backed sessions
///
/// Uniqueness of emails and provider identities, and cascade delete of
/// accounts/sessions with their user, are declared in `migrations/`.

pub mod account;
pub mod session;
pub mod user;
