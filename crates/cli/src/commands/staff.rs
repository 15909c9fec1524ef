//! Staff account commands.
//!
//! Bootstraps staff directly against the database, which is the alternative
//! to enabling the API's break-glass override for the first executive.

use loyalty_api::db::{PgUserDirectory, create_pool};
use loyalty_api::models::StaffSignup;
use loyalty_api::services::auth::{AuthError, AuthService, CredentialVerifier};
use loyalty_core::{ParseVariantError, UserVariant};
use secrecy::SecretString;
use thiserror::Error;

/// Environment variable holding the new account's password.
const PASSWORD_ENV: &str = "LOYALTY_BOOTSTRAP_PASSWORD";

/// Errors that can occur during staff operations.
#[derive(Debug, Error)]
pub enum StaffError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    InvalidVariant(#[from] ParseVariantError),

    #[error("Could not create account: {0}")]
    Auth(#[from] AuthError),
}

/// Create an active staff account.
///
/// # Errors
///
/// Returns `StaffError` for a bad variant or input, a taken email or phone,
/// or a database failure.
pub async fn create(
    variant: &str,
    email: String,
    name: String,
    phone: Option<String>,
) -> Result<(), StaffError> {
    let variant: UserVariant = variant.parse()?;
    let database_url =
        super::database_url().ok_or(StaffError::MissingEnvVar("LOYALTY_DATABASE_URL"))?;
    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| StaffError::MissingEnvVar(PASSWORD_ENV))?;

    tracing::info!("Connecting to loyalty database...");
    let directory = PgUserDirectory::new(create_pool(&database_url).await?);
    let verifier = CredentialVerifier::default();

    let identity = AuthService::new(&directory, &verifier)
        .create_staff(
            variant,
            StaffSignup {
                name,
                email,
                phone,
                password,
                dev_secret: None,
            },
        )
        .await?;

    tracing::info!(
        "{} created successfully! ID: {}, Username: {}",
        variant,
        identity.id(),
        identity.profile().username
    );
    Ok(())
}
