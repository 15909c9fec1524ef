//! Contact details: email, phone, and the "at least one of them" rule.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing an [`Email`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    #[error("email must not contain whitespace")]
    Whitespace,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain must contain a dot between non-empty labels")]
    InvalidDomain,
}

/// Errors that can occur when parsing a [`Phone`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number contains an invalid character: {0:?}")]
    InvalidCharacter(char),
    #[error("phone number must have between {min} and {max} digits")]
    DigitCount { min: usize, max: usize },
}

/// Error for contact details that have neither email nor phone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("an email address or a phone number is required")]
pub struct ContactError;

/// A syntactically valid email address.
///
/// Stricter than a bare `@` check: the domain must contain a dot, and the
/// address must not contain whitespace.
///
/// ```
/// use loyalty_core::Email;
///
/// assert!(Email::parse("member@example.com").is_ok());
/// assert!(Email::parse("member@localhost").is_err());
/// assert!(Email::parse("two@@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first rule the input breaks.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::AtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::AtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// A mobile phone number.
///
/// Accepts an optional leading `+` followed by 7–15 digits, with spaces,
/// dashes, dots and parentheses allowed as separators. The trimmed input is
/// kept verbatim because login matches the phone handle exactly as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub const MIN_DIGITS: usize = 7;
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Phone`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if the input is empty, contains characters
    /// other than digits and separators, or has the wrong number of digits.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let body = s.strip_prefix('+').unwrap_or(s);
        let mut digits = 0_usize;
        for c in body.chars() {
            match c {
                '0'..='9' => digits += 1,
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(PhoneError::DigitCount {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as entered (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

/// Ways to reach an identity. At least one channel is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<Phone>,
}

impl ContactInfo {
    /// Combine optional email and phone.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] when both are absent.
    pub fn new(email: Option<Email>, phone: Option<Phone>) -> Result<Self, ContactError> {
        if email.is_none() && phone.is_none() {
            return Err(ContactError);
        }
        Ok(Self { email, phone })
    }

    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    #[must_use]
    pub const fn phone(&self) -> Option<&Phone> {
        self.phone.as_ref()
    }

    /// Replace the email, keeping the phone.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] when this would leave no channel.
    pub fn with_email(&self, email: Option<Email>) -> Result<Self, ContactError> {
        Self::new(email, self.phone.clone())
    }

    /// Replace the phone, keeping the email.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] when this would leave no channel.
    pub fn with_phone(&self, phone: Option<Phone>) -> Result<Self, ContactError> {
        Self::new(self.email.clone(), phone)
    }

    /// Split back into the optional parts.
    #[must_use]
    pub fn into_parts(self) -> (Option<Email>, Option<Phone>) {
        (self.email, self.phone)
    }
}
