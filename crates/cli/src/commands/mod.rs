//! CLI subcommands.
//!
//! # Environment Variables
//!
//! - `LOYALTY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

pub mod migrate;
pub mod staff;

use secrecy::SecretString;

/// Read the database URL the same way the API does.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var("LOYALTY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
