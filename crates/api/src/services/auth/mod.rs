//! Authentication service.
//!
//! Login against a variant's store, customer self-registration with email
//! verification, staff account creation, and customer profile updates.

pub mod credential;
mod error;

pub use credential::{CredentialError, CredentialVerifier};
pub use error::{AuthError, LoginFailure};

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

use loyalty_core::{Birthday, ContactInfo, Email, Phone, UserId, UserVariant};

use crate::db::{RepositoryError, UserDirectory, VariantDirectory};
use crate::models::{
    CustomerChanges, CustomerSignup, CustomerUpdate, Identity, NewIdentity, NewKind, NewUser,
    StaffSignup,
};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_NAME_LENGTH: usize = 100;
const MAX_ADDRESS_LENGTH: usize = 200;
/// Random bytes in a verification token (hex-encoded on the wire).
const VERIFY_TOKEN_BYTES: usize = 16;

/// Authentication service.
pub struct AuthService<'a> {
    directory: &'a dyn UserDirectory,
    verifier: &'a CredentialVerifier,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(directory: &'a dyn UserDirectory, verifier: &'a CredentialVerifier) -> Self {
        Self {
            directory,
            verifier,
        }
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Log in to the claimed variant with a username or phone number.
    ///
    /// Checks run in a fixed order: the handle must exist, the password must
    /// match, and only then is the account required to be active.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Login` with the refusal reason, or an
    /// infrastructure error if the directory or hashing fails.
    pub async fn login(
        &self,
        variant: UserVariant,
        handle: &str,
        password: SecretString,
    ) -> Result<Identity, AuthError> {
        let stored = VariantDirectory::new(self.directory, variant)
            .find_by_login_handle(handle.trim())
            .await?
            .ok_or(AuthError::Login(LoginFailure::UnknownHandle))?;

        if !self.verifier.verify(password, stored.password_hash).await? {
            return Err(AuthError::Login(LoginFailure::WrongSecret));
        }
        if !stored.identity.is_active() {
            return Err(AuthError::Login(LoginFailure::AccountNotVerified));
        }

        Ok(stored.identity)
    }

    // =========================================================================
    // Customer Registration
    // =========================================================================

    /// Register a new, inactive customer.
    ///
    /// The returned customer carries the verification token to deliver.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input and `AuthError::AlreadyExists`
    /// when the email or phone is taken.
    pub async fn register_customer(
        &self,
        signup: CustomerSignup,
        today: NaiveDate,
    ) -> Result<Identity, AuthError> {
        let email = Email::parse(&signup.email)?;
        if let Some(username) = &signup.username
            && username.trim() != email.as_str()
        {
            return Err(AuthError::Validation("username must match email".to_owned()));
        }
        let phone = Phone::parse(&signup.phone)?;
        let name = validate_length("name", &signup.name, MAX_NAME_LENGTH)?;
        let address = validate_length("address", &signup.address, MAX_ADDRESS_LENGTH)?;
        let birthday = Birthday::parse(&signup.birthday, today)?;
        validate_password(&signup.password, false)?;

        let password_hash = self.verifier.hash(signup.password).await?;
        let new = NewIdentity {
            user: NewUser {
                name,
                username: email.as_str().to_owned(),
                contact: ContactInfo::new(Some(email), Some(phone))?,
                password_hash,
            },
            kind: NewKind::Customer {
                address,
                birthday,
                verify_token: generate_verify_token(),
            },
        };

        self.directory.insert(new).await.map_err(conflict_message)
    }

    /// Redeem a verification token, activating its customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenNotFound` for unknown or spent tokens.
    pub async fn redeem_verification(&self, token: &str) -> Result<UserId, AuthError> {
        self.directory
            .redeem_verify_token(token)
            .await?
            .ok_or(AuthError::TokenNotFound)
    }

    // =========================================================================
    // Staff Accounts
    // =========================================================================

    /// Create an active staff account. The username is the email address.
    ///
    /// Staff passwords must also contain a symbol.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input or a customer variant, and
    /// `AuthError::AlreadyExists` when the email or phone is taken.
    pub async fn create_staff(
        &self,
        variant: UserVariant,
        signup: StaffSignup,
    ) -> Result<Identity, AuthError> {
        let kind = match variant {
            UserVariant::Manager => NewKind::Manager,
            UserVariant::Executive => NewKind::Executive,
            UserVariant::Cashier => NewKind::Cashier,
            UserVariant::Customer => {
                return Err(AuthError::Validation(
                    "customers register themselves".to_owned(),
                ));
            }
        };

        let email = Email::parse(&signup.email)?;
        let phone = signup
            .phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(Phone::parse)
            .transpose()?;
        let name = validate_length("name", &signup.name, MAX_NAME_LENGTH)?;
        validate_password(&signup.password, true)?;

        let password_hash = self.verifier.hash(signup.password).await?;
        let new = NewIdentity {
            user: NewUser {
                name,
                username: email.as_str().to_owned(),
                contact: ContactInfo::new(Some(email), phone)?,
                password_hash,
            },
            kind,
        };

        self.directory.insert(new).await.map_err(conflict_message)
    }

    // =========================================================================
    // Customer Maintenance
    // =========================================================================

    /// Validate and apply whitelisted changes to a customer.
    ///
    /// Returns whether a customer with that id existed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad or empty input and
    /// `AuthError::AlreadyExists` when a new email or phone is taken.
    pub async fn update_customer(
        &self,
        id: UserId,
        changes: CustomerChanges,
        today: NaiveDate,
    ) -> Result<bool, AuthError> {
        let password_hash = match changes.password {
            Some(password) => {
                validate_password(&password, false)?;
                Some(self.verifier.hash(password).await?)
            }
            None => None,
        };
        let update = CustomerUpdate {
            name: changes
                .name
                .as_deref()
                .map(|n| validate_length("name", n, MAX_NAME_LENGTH))
                .transpose()?,
            email: changes.email.as_deref().map(Email::parse).transpose()?,
            phone: changes.phone.as_deref().map(Phone::parse).transpose()?,
            address: changes
                .address
                .as_deref()
                .map(|a| validate_length("address", a, MAX_ADDRESS_LENGTH))
                .transpose()?,
            birthday: changes
                .birthday
                .as_deref()
                .map(|b| Birthday::parse(b, today))
                .transpose()?,
            password_hash,
            preferences: changes.preferences,
        };
        if update.is_empty() {
            return Err(AuthError::Validation("update has no fields".to_owned()));
        }

        self.directory
            .update_customer(id, &update)
            .await
            .map_err(conflict_message)
    }

    /// Delete a customer. Returns whether one was deleted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the directory fails.
    pub async fn delete_customer(&self, id: UserId) -> Result<bool, AuthError> {
        Ok(VariantDirectory::new(self.directory, UserVariant::Customer)
            .delete(id)
            .await?)
    }
}

/// Phrase uniqueness conflicts in terms of the fields the client sent.
fn conflict_message(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(msg) if msg.contains("phone") => {
            AuthError::AlreadyExists("Phone number already exists".to_owned())
        }
        RepositoryError::Conflict(_) => AuthError::AlreadyExists("Email already exists".to_owned()),
        other => AuthError::Repository(other),
    }
}

/// Trim `value` and require 1 to `max` characters.
fn validate_length(field: &str, value: &str, max: usize) -> Result<String, AuthError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > max {
        return Err(AuthError::Validation(format!(
            "{field} must be between 1 and {max} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Validate password strength.
///
/// At least 8 characters with an uppercase letter, a lowercase letter and a
/// digit; staff passwords additionally need a symbol.
pub fn validate_password(password: &SecretString, require_symbol: bool) -> Result<(), AuthError> {
    let password = password.expose_secret();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AuthError::WeakPassword(
            "password must contain an uppercase letter".to_owned(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AuthError::WeakPassword(
            "password must contain a lowercase letter".to_owned(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword("password must contain a digit".to_owned()));
    }
    if require_symbol && password.chars().all(char::is_alphanumeric) {
        return Err(AuthError::WeakPassword("password must contain a symbol".to_owned()));
    }
    Ok(())
}

/// Generate a random single-use verification token.
fn generate_verify_token() -> String {
    let bytes: [u8; VERIFY_TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}
