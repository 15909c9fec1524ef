//! Authentication error types.

use thiserror::Error;

use loyalty_core::{BirthdayError, ContactError, EmailError, PhoneError};

use super::credential::CredentialError;
use crate::db::RepositoryError;

/// Why a login attempt was refused.
///
/// Clients only ever see a generic "Invalid credentials"; the reason is for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginFailure {
    #[error("no account with that username or phone")]
    UnknownHandle,
    #[error("wrong password")]
    WrongSecret,
    #[error("account not verified")]
    AccountNotVerified,
}

/// Errors that can occur during authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login refused.
    #[error("invalid credentials ({0})")]
    Login(LoginFailure),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid phone format.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Neither email nor phone given.
    #[error(transparent)]
    MissingContact(#[from] ContactError),

    /// Birthday unparseable or too recent.
    #[error("invalid birthday: {0}")]
    InvalidBirthday(#[from] BirthdayError),

    /// Any other rejected field.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Username or phone already taken.
    #[error("{0}")]
    AlreadyExists(String),

    /// Verification token unknown or already redeemed.
    #[error("verification token not found")]
    TokenNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),

    /// Password hashing error.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl From<RepositoryError> for AuthError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::AlreadyExists(msg),
            other => Self::Repository(other),
        }
    }
}
