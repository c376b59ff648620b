//! # AuthGate API Server
//!
//! Authentication service: credentials and OAuth sign-in, sessions, and a
//! route guard protecting pages.
//!
//! ## Usage
//!
//! ```bash
//! AUTH_SECRET=$(openssl rand -hex 32) cargo run -p authgate-api
//! ```
//!
//! Without `DATABASE_URL` the server runs on in-memory storage.

use authgate_api::{
    app::{build_router, AppState},
    config::Config,
};
use authgate_shared::{
    adapter::{AuthAdapter, MemoryAdapter, PgAdapter},
    db::{migrations::run_migrations, pool::create_pool},
};
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired database sessions are purged
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate_api=debug,authgate_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "AuthGate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let adapter: Arc<dyn AuthAdapter> = match config.pool_config() {
        Some(pool_config) => {
            let pool = create_pool(pool_config).await?;
            run_migrations(&pool).await?;
            Arc::new(PgAdapter::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage (data is lost on restart)");
            Arc::new(MemoryAdapter::new())
        }
    };
    tracing::info!(storage = adapter.backend_name(), "Storage ready");

    spawn_session_cleanup(adapter.clone());

    let bind_address = config.bind_address();
    let state = AppState::new(adapter, config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically deletes expired sessions
fn spawn_session_cleanup(adapter: Arc<dyn AuthAdapter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match adapter.delete_expired_sessions().await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
