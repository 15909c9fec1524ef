//! Session middleware configuration.
//!
//! Sessions hold exactly one value, the logged-in [`UserId`]. Everything
//! else is resolved from the directory on each request.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use loyalty_core::UserId;

use crate::config::ApiConfig;
use crate::models::keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "loyalty_session";

/// Create the `PostgreSQL` session store in the `loyalty` schema.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected.
pub fn postgres_store(pool: &PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool.clone())
        .with_schema_name("loyalty")?
        .with_table_name("session")
}

/// Create the session layer over any store.
///
/// The cookie is HTTP-only and expires after `session_expiry_seconds` of
/// inactivity.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &ApiConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(config.session_expiry_seconds),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Bind the session to `user_id` under a fresh session id.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn start_session(
    session: &Session,
    user_id: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::USER_ID, user_id).await
}

/// Destroy the session. Safe to call on a session that is already gone.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn end_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
