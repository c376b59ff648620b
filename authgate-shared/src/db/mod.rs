/// Database layer for authgate
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded sqlx migrations (users, accounts, sessions)
///
/// Models are in the `models` module at crate root level; the auth flows
/// reach them through [`crate::adapter::PgAdapter`].

pub mod migrations;
pub mod pool;
