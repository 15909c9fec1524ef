//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, `PostgreSQL` store in production)
//! 4. Per-route authorization guard (resolves the session identity once)

pub mod guard;
pub mod identity;
pub mod session;

pub use guard::{Owner, authorize, guarded};
pub use identity::{CurrentIdentity, ResolvedIdentity, resolve_session};
pub use session::{create_session_layer, end_session, postgres_store, start_session};
