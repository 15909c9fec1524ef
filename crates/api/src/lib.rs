//! Loyalty API library.
//!
//! Session identity and role-based authorization for the loyalty platform,
//! exposed as a library so the router can be driven in-process by tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
pub use state::AppState;
