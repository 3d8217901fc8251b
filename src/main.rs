//! Account Transfer Server - Main Application Entry Point
//!
//! A REST API for creating, listing, fetching and deleting accounts and for
//! moving money into them. Fetching and deleting an account requires a signed
//! credential issued for that account.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store for development
//! - **Authentication**: HS256 JSON Web Tokens bound to an account number
//! - **Format**: JSON requests/responses, `{"error": ...}` on failure
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations (if `DATABASE_URL` is set)
//! 3. Build the credential service from the configured secret
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured address

mod app;
mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod middleware;
mod models;
mod services;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    services::token_service::TokenService,
    store::{AccountStore, InMemoryAccountStore, PgAccountStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    let store: Arc<dyn AccountStore> = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url, config.database_max_connections).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgAccountStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts are kept in memory only");
            Arc::new(InMemoryAccountStore::new())
        }
    };

    let tokens = TokenService::new(
        config.jwt_secret.as_bytes(),
        chrono::Duration::seconds(config.token_ttl_secs),
    );

    let app = app::router(app::AppState::new(store, tokens));

    // Bind to network address and start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
