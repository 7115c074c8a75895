//! Database access for the booking operator tool.
//!
//! - [`config`]: connection settings loaded from the environment.
//! - [`models`] / [`repositories`]: typed rows and the queries that load them.
//! - [`checks`]: evaluation of catalog checks from `bookops_core::migrations`.
//! - [`runner`]: applies a migration file and verifies its post-checks.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod checks;
pub mod config;
pub mod models;
pub mod repositories;
pub mod runner;

pub use config::{ConfigError, DbConfig};
pub use runner::{MigrationError, MigrationOutcome, MigrationReport, MigrationRunner};

pub type DbPool = sqlx::PgPool;

/// Application name reported to the server (`pg_stat_activity`).
pub const APPLICATION_NAME: &str = "bookops";

/// Create the pool for one command invocation.
///
/// Two connections at most: one for queries and one that a `LISTEN`
/// session can hold while the other publishes or mutates.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    let options = config.connect_options()?.application_name(APPLICATION_NAME);

    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await
}

/// Verify the connection works.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// The server's `version()` string.
pub async fn server_version(pool: &DbPool) -> Result<String, sqlx::Error> {
    sqlx::query_scalar("SELECT version()").fetch_one(pool).await
}
