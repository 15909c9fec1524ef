//! Customer routes: registration, verification and administration.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{delete, get, patch, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;

use loyalty_core::{UserId, UserVariant};

use super::{info, parse_body, success};
use crate::authz::Predicate;
use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::{Owner, ResolvedIdentity, end_session, guarded};
use crate::models::{CustomerChanges, CustomerSignup, Identity};
use crate::state::AppState;

/// `{"filter": {"_id": ...}}`; the id itself is read by the guard.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    #[serde(rename = "_id")]
    pub id: Option<Value>,
}

/// Body of `PATCH /api/customers`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRequest {
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default, rename = "_id")]
    pub id: Option<Value>,
    pub update: CustomerChanges,
}

/// Body of `DELETE /api/customers/delete`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteRequest {
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default, rename = "_id")]
    pub id: Option<Value>,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verify/{token}", get(verify))
        .route("/one/{id}", guarded(get(one), state, Predicate::Manager))
        .route("/all", guarded(get(all), state, Predicate::Manager))
        .route("/", guarded(patch(update), state, Predicate::ManagerOrSelf))
        .route("/delete", guarded(delete(remove), state, Predicate::ManagerOrSelf))
}

/// Register an inactive customer and issue a verification token.
pub async fn signup(State(state): State<AppState>, body: Json<Value>) -> Result<impl IntoResponse> {
    let signup: CustomerSignup = parse_body(body)?;
    let identity = state
        .auth()
        .register_customer(signup, Utc::now().date_naive())
        .await?;

    if let Some(token) = identity.as_customer().and_then(|c| c.verify_token.as_deref()) {
        // Email delivery is external; the link is logged for it to pick up.
        tracing::debug!(
            user_id = %identity.id(),
            link = %format!("/api/customers/verify/{token}"),
            "Verification link issued"
        );
    }
    tracing::info!(user_id = %identity.id(), "Customer registered");

    Ok((StatusCode::CREATED, success("Customer created.")))
}

/// Redeem a verification token, then send the browser to the login page.
pub async fn verify(State(state): State<AppState>, Path(token): Path<String>) -> Result<Redirect> {
    let user_id = state.auth().redeem_verification(&token).await?;
    tracing::info!(user_id = %user_id, "Customer verified");
    Ok(Redirect::to(&state.config().login_url()))
}

pub async fn one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Identity>> {
    let id: UserId = id
        .parse()
        .map_err(|e: loyalty_core::ParseIdError| AppError::BadRequest(e.to_string()))?;
    state
        .directory_for(UserVariant::Customer)
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
}

pub async fn all(State(state): State<AppState>) -> Result<Json<Vec<Identity>>> {
    Ok(Json(state.directory_for(UserVariant::Customer).list().await?))
}

/// Apply whitelisted changes to the customer named by the filter.
pub async fn update(
    State(state): State<AppState>,
    Owner(id): Owner,
    body: Json<Value>,
) -> Result<impl IntoResponse> {
    let request: UpdateRequest = parse_body(body)?;
    let updated = state
        .auth()
        .update_customer(id, request.update, Utc::now().date_naive())
        .await?;

    if updated {
        tracing::info!(user_id = %id, "Customer updated");
        Ok((StatusCode::OK, success("Updated 1 user(s).")))
    } else {
        Ok((StatusCode::ACCEPTED, info("No user(s) updated.")))
    }
}

/// Delete the customer named by the filter. Deleting yourself also logs you out.
pub async fn remove(
    State(state): State<AppState>,
    Extension(ResolvedIdentity(caller)): Extension<ResolvedIdentity>,
    Owner(id): Owner,
    session: Session,
    body: Json<Value>,
) -> Result<impl IntoResponse> {
    let _: DeleteRequest = parse_body(body)?;
    if !state.auth().delete_customer(id).await? {
        return Ok((StatusCode::ACCEPTED, info("No customer(s) deleted.")));
    }

    tracing::info!(user_id = %id, "Customer deleted");
    if caller.is_some_and(|caller| caller.id() == id) {
        end_session(&session).await?;
        clear_sentry_user();
    }
    Ok((StatusCode::OK, success("Deleted 1 customer(s).")))
}
