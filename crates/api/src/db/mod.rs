//! Identity persistence.
//!
//! # Database: `loyalty`
//!
//! Each user variant has its own table; all four share one UUID id space.
//!
//! ## Tables
//!
//! - `loyalty.customer` - Self-registered members (inactive until verified)
//! - `loyalty.manager` - Store managers
//! - `loyalty.executive` - Chain owners
//! - `loyalty.cashier` - Point-of-sale staff
//! - `loyalty.session` - Tower-sessions storage (created by the store's own migration)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p loyalty-cli -- migrate
//! ```

pub mod directory;
pub mod memory;
pub mod postgres;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use directory::{UserDirectory, VariantDirectory};
pub use memory::MemoryUserDirectory;
pub use postgres::PgUserDirectory;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., username or phone already taken).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
