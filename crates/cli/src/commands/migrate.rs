//! Database migration commands.
//!
//! Runs the identity table migrations from `crates/api/migrations/`, then
//! the session store's own migration.

use loyalty_api::db::create_pool;
use loyalty_api::middleware::postgres_store;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: LOYALTY_DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Session store configuration error: {0}")]
    SessionStore(String),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().ok_or(MigrationError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to loyalty database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running identity table migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Running session store migration...");
    postgres_store(&pool)
        .map_err(MigrationError::SessionStore)?
        .migrate()
        .await?;

    tracing::info!("Migrations complete");
    Ok(())
}
