//! Session routes: login, logout, and who am I.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;

use loyalty_core::UserVariant;

use super::{parse_body, success};
use crate::authz::Predicate;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{CurrentIdentity, end_session, guarded, start_session};
use crate::models::Identity;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Login request body. `username` also accepts a phone number.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/login/{type}", post(login))
        .route("/logout", post(logout))
        .route("/loggedin", guarded(get(logged_in), state, Predicate::Authenticated))
        .route("/self", guarded(get(current), state, Predicate::Authenticated))
}

/// Log in to the variant named in the path.
///
/// All three refusal reasons produce the same 401; the reason is only logged.
pub async fn login(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    session: Session,
    body: Json<Value>,
) -> Result<impl IntoResponse> {
    let variant: UserVariant = kind
        .parse()
        .map_err(|e: loyalty_core::ParseVariantError| AppError::BadRequest(e.to_string()))?;
    let request: LoginRequest = parse_body(body)?;

    let identity = match state
        .auth()
        .login(variant, &request.username, request.password)
        .await
    {
        Ok(identity) => identity,
        Err(AuthError::Login(reason)) => {
            tracing::info!(variant = %variant, reason = %reason, "Login refused");
            return Err(AuthError::Login(reason).into());
        }
        Err(e) => return Err(e.into()),
    };

    start_session(&session, identity.id()).await?;
    set_sentry_user(&identity.id(), None);
    tracing::info!(user_id = %identity.id(), variant = %variant, "Logged in");

    Ok(success("Logged in."))
}

/// End the session. Succeeds whether or not one existed.
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    end_session(&session).await?;
    clear_sentry_user();
    Ok(success("Logged out."))
}

pub async fn logged_in(CurrentIdentity(identity): CurrentIdentity) -> Json<Value> {
    Json(json!({ "loggedIn": true, "type": identity.variant() }))
}

/// The caller's own record.
pub async fn current(CurrentIdentity(identity): CurrentIdentity) -> Json<Identity> {
    Json(Identity::clone(&identity))
}
