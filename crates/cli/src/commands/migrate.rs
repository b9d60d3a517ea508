//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pmw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations live in `crates/api/migrations/` and are embedded in the
//! binary at compile time, so the CLI can migrate a database without a
//! source checkout.

use sqlx::PgPool;
use thiserror::Error;

/// Failures from the `migrate` subcommand.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the
/// connection fails, or a migration fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("API_DATABASE_URL"))?;

    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("applying migrations");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("migrations complete");
    Ok(())
}
