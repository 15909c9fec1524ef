//! Loyalty Core - Shared identity and domain types.
//!
//! This crate provides the types shared by every loyalty component:
//! - `api` - The REST API (sessions, authorization, customer administration)
//! - `cli` - Command-line tools for migrations and staff bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. This keeps the identity model usable from anywhere,
//! including the authorization engine which must stay side-effect free.
//!
//! # Modules
//!
//! - [`types`] - UUID-backed IDs, user variants and ranks, contact details, birthdays

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
