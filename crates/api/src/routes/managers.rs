//! Manager administration routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::Value;

use loyalty_core::UserVariant;

use super::{parse_body, success};
use crate::authz::Predicate;
use crate::error::Result;
use crate::middleware::{CurrentIdentity, guarded};
use crate::models::{Identity, StaffSignup};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/all", guarded(get(all), state, Predicate::Executive))
        .route("/create", guarded(post(create), state, Predicate::Executive))
}

pub async fn all(State(state): State<AppState>) -> Result<Json<Vec<Identity>>> {
    Ok(Json(state.directory_for(UserVariant::Manager).list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentIdentity(caller): CurrentIdentity,
    body: Json<Value>,
) -> Result<impl IntoResponse> {
    let signup: StaffSignup = parse_body(body)?;
    let manager = state.auth().create_staff(UserVariant::Manager, signup).await?;
    tracing::info!(user_id = %manager.id(), created_by = %caller.id(), "Manager created");
    Ok((StatusCode::CREATED, success("Manager created.")))
}
