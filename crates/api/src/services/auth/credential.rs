//! Password hashing and verification.
//!
//! Argon2 is deliberately slow, so both operations run on tokio's blocking
//! pool instead of the request task.

use argon2::{
    Argon2, Params,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors other than a password mismatch.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The stored hash is not a valid PHC string.
    #[error("stored password hash is malformed")]
    MalformedHash,

    /// Hashing or verification failed for a reason other than a mismatch.
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    /// The blocking task panicked or was cancelled.
    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Verifies and hashes passwords with Argon2id.
#[derive(Clone, Default)]
pub struct CredentialVerifier {
    params: Params,
}

impl CredentialVerifier {
    /// Use custom Argon2 cost parameters for new hashes.
    ///
    /// Verification always uses the parameters recorded in the stored hash.
    #[must_use]
    pub const fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Check `plaintext` against a stored PHC hash string.
    ///
    /// Returns `Ok(false)` on a mismatch. The comparison is constant time.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the hash is malformed or hashing fails.
    pub async fn verify(
        &self,
        plaintext: SecretString,
        stored_hash: SecretString,
    ) -> Result<bool, CredentialError> {
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(stored_hash.expose_secret())
                .map_err(|_| CredentialError::MalformedHash)?;
            match Argon2::default().verify_password(plaintext.expose_secret().as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(password_hash::Error::Password) => Ok(false),
                Err(e) => Err(CredentialError::Hash(e)),
            }
        })
        .await?
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if hashing fails.
    pub async fn hash(&self, plaintext: SecretString) -> Result<String, CredentialError> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
                .hash_password(plaintext.expose_secret().as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(CredentialError::Hash)
        })
        .await?
    }
}
