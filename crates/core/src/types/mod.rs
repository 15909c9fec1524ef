//! Core types for the loyalty platform.
//!
//! This module provides type-safe wrappers for the identity model.

pub mod birthday;
pub mod contact;
pub mod id;
pub mod variant;

pub use birthday::{Birthday, BirthdayError};
pub use contact::{ContactError, ContactInfo, Email, EmailError, Phone, PhoneError};
pub use id::*;
pub use variant::{ParseVariantError, Rank, UserVariant};
