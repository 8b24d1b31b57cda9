//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migrations live in `crates/checkout/migrations/` and are embedded at
//! compile time.

use secrecy::SecretString;
use thiserror::Error;
use tierstore_checkout::db;

/// Errors from running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run checkout database migrations.
///
/// # Errors
///
/// Returns an error if the URL is missing, the database is unreachable or a
/// migration fails.
pub async fn checkout() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CHECKOUT_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("CHECKOUT_DATABASE_URL"))?;

    tracing::info!("Connecting to checkout database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running checkout migrations...");
    sqlx::migrate!("../checkout/migrations").run(&pool).await?;

    tracing::info!("Checkout migrations complete!");
    Ok(())
}
