//! Route guard: adapts authorization predicates to axum middleware.
//!
//! ```rust,ignore
//! .route("/all", guarded(get(list), &state, Predicate::Manager))
//! ```
//!
//! A denied request never reaches the handler and gets the bare status
//! code. An allowed one carries [`ResolvedIdentity`] and [`OwnerId`] in its
//! extensions for [`CurrentIdentity`](super::CurrentIdentity) and [`Owner`].

use axum::{
    body::{Body, to_bytes},
    extract::{FromRequestParts, RawPathParams, Request, State, rejection::RawPathParamsRejection},
    http::{StatusCode, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use secrecy::SecretString;
use serde_json::Value;
use tower_sessions::Session;

use loyalty_core::UserId;

use super::identity::{ResolvedIdentity, resolve_session};
use crate::authz::{AccessRequest, Decision, OwnerId, Predicate};
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Largest body the guard will buffer to look for owner ids or a secret.
const MAX_INSPECTED_BODY_BYTES: usize = 64 * 1024;

/// Body field carrying the break-glass secret.
const DEV_SECRET_FIELD: &str = "devSecret";

/// Wrap a route so `predicate` must allow before it runs.
pub fn guarded(
    route: MethodRouter<AppState>,
    state: &AppState,
    predicate: Predicate,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        (state.clone(), predicate),
        authorize,
    ))
}

/// Evaluate `predicate` for the request.
///
/// # Errors
///
/// Returns `AppError` if the session store or directory fails, or the
/// session names a user that no longer exists.
pub async fn authorize(
    State((state, predicate)): State<(AppState, Predicate)>,
    session: Session,
    path: Result<RawPathParams, RawPathParamsRejection>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_session(&state, &session).await?;

    let (mut request, body) = if predicate.needs_owner() || predicate.needs_dev_secret() {
        let (parts, body) = request.into_parts();
        match to_bytes(body, MAX_INSPECTED_BODY_BYTES).await {
            Ok(bytes) => {
                let inspected = InspectedBody::from_bytes(&bytes);
                (Request::from_parts(parts, Body::from(bytes)), inspected)
            }
            Err(_) => (Request::from_parts(parts, Body::empty()), InspectedBody::TooLarge),
        }
    } else {
        (request, InspectedBody::Empty)
    };

    let owner = if predicate.needs_owner() {
        match &body {
            InspectedBody::Unparseable | InspectedBody::TooLarge => OwnerId::Malformed,
            InspectedBody::Empty | InspectedBody::Json(_) => {
                let path_id = path.ok().and_then(|params| {
                    params
                        .iter()
                        .find(|(name, _)| *name == "id")
                        .map(|(_, value)| value.to_owned())
                });
                OwnerId::resolve(path_id.as_deref(), body.json())
            }
        }
    } else {
        OwnerId::Absent
    };
    let dev_secret = body
        .json()
        .filter(|_| predicate.needs_dev_secret())
        .and_then(|b| b.get(DEV_SECRET_FIELD))
        .and_then(Value::as_str)
        .map(|s| SecretString::from(s.to_owned()));

    let decision = predicate.evaluate(&AccessRequest {
        identity: identity.as_deref(),
        owner,
        dev_secret: dev_secret.as_ref(),
        break_glass: state.break_glass(),
    });

    match decision {
        Decision::Allow if matches!(body, InspectedBody::TooLarge) => {
            Err(AppError::BadRequest("Request body too large".to_string()))
        }
        Decision::Allow => {
            if let Some(identity) = &identity {
                set_sentry_user(&identity.id(), None);
            }
            request.extensions_mut().insert(ResolvedIdentity(identity));
            request.extensions_mut().insert(owner);
            Ok(next.run(request).await)
        }
        Decision::Deny(denial) => {
            tracing::debug!(
                predicate = ?predicate,
                denial = ?denial,
                path = %request.uri().path(),
                "Request denied"
            );
            Ok(denial.status().into_response())
        }
    }
}

/// The guard's view of a buffered request body.
enum InspectedBody {
    /// Not read, or read and empty.
    Empty,
    Json(Value),
    /// Non-empty but not JSON.
    Unparseable,
    /// Over [`MAX_INSPECTED_BODY_BYTES`]; the body was dropped.
    TooLarge,
}

impl InspectedBody {
    fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        serde_json::from_slice(bytes).map_or(Self::Unparseable, Self::Json)
    }

    const fn json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Extractor for the single owner id a guarded request names.
///
/// Rejects with 400 when the request names no owner, or conflicting or
/// malformed ones.
pub struct Owner(pub UserId);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OwnerId>()
            .and_then(|owner| owner.present())
            .map(Self)
            .ok_or(StatusCode::BAD_REQUEST)
    }
}
