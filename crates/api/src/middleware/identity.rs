//! Session to identity resolution.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tower_sessions::Session;

use loyalty_core::UserId;

use crate::error::AppError;
use crate::models::{Identity, keys};
use crate::state::AppState;

/// The identity resolved for this request, stored in request extensions by
/// the authorization guard. `None` means no session.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity(pub Option<Arc<Identity>>);

/// Resolve the session's user id to an identity.
///
/// Returns `Ok(None)` when the session has no user. Fails closed with
/// `AppError::OrphanedSession` when the id is in no variant store.
///
/// # Errors
///
/// Returns `AppError` if the session store or directory fails, or the
/// session is orphaned.
pub async fn resolve_session(
    state: &AppState,
    session: &Session,
) -> Result<Option<Arc<Identity>>, AppError> {
    let Some(user_id) = session.get::<UserId>(keys::USER_ID).await? else {
        return Ok(None);
    };

    match state.directory().resolve_any_variant(user_id).await? {
        Some(identity) => Ok(Some(Arc::new(identity))),
        None => Err(AppError::OrphanedSession(user_id)),
    }
}

/// Extractor for the authenticated caller.
///
/// Only available on routes behind a guard; rejects with 401 otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> String {
///     identity.profile().name.clone()
/// }
/// ```
pub struct CurrentIdentity(pub Arc<Identity>);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedIdentity>()
            .and_then(|resolved| resolved.0.clone())
            .map(Self)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
