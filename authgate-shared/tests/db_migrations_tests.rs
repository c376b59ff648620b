/// Integration tests for database migrations
///
/// These tests require a running PostgreSQL database.
/// Run with: cargo test --test db_migrations_tests -- --test-threads=1

mod common;

use authgate_shared::db::migrations::{ensure_database_exists, get_migration_status, run_migrations};
use authgate_shared::db::pool::close_pool;

#[tokio::test]
async fn test_ensure_database_exists() {
    let result = ensure_database_exists(&common::database_url()).await;
    assert!(result.is_ok(), "Failed to ensure database exists: {:?}", result.err());
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let pool = common::migrated_pool().await;
    let first = get_migration_status(&pool).await.expect("Failed to get status");

    run_migrations(&pool).await.expect("Second migration run failed");
    let second = get_migration_status(&pool).await.expect("Failed to get status");

    assert!(first.applied_migrations >= 3);
    assert_eq!(first.applied_migrations, second.applied_migrations);
    assert_eq!(first.latest_version, second.latest_version);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_migration_creates_auth_tables() {
    let pool = common::migrated_pool().await;

    for table_name in ["users", "accounts", "sessions"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public'
                AND table_name = $1
            )",
        )
        .bind(table_name)
        .fetch_one(&pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to check for table {}: {}", table_name, e));

        assert!(exists, "Table '{}' should exist after migrations", table_name);
    }

    close_pool(pool).await;
}

#[tokio::test]
async fn test_email_uniqueness_is_case_insensitive() {
    let pool = common::migrated_pool().await;
    let email = common::unique_email("CaseTest");

    sqlx::query("INSERT INTO users (email) VALUES ($1)")
        .bind(&email)
        .execute(&pool)
        .await
        .expect("First insert failed");

    let duplicate = sqlx::query("INSERT INTO users (email) VALUES ($1)")
        .bind(email.to_lowercase())
        .execute(&pool)
        .await;
    assert!(duplicate.is_err(), "citext email should reject case variants");

    close_pool(pool).await;
}
