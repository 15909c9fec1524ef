//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Login, customer registration and verification, staff accounts

pub mod auth;
