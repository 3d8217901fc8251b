//! Database connection pool and schema management.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Creating the `account` table at startup

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// The pool is shared by every request; transaction isolation is left to
/// PostgreSQL.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// The account table migration uses `CREATE TABLE IF NOT EXISTS`, so running
/// against a database that already has the table is a no-op. Applied
/// migrations are tracked in `_sqlx_migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds the migration files at compile time
    sqlx::migrate!("./migrations").run(pool).await
}
