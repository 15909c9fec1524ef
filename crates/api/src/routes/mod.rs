//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness check
//!
//! # Session
//! POST   /api/user/login/{type}      - Log in as customer|manager|executive|cashier
//! POST   /api/user/logout            - End the session
//! GET    /api/user/loggedin          - Authenticated
//! GET    /api/user/self              - Authenticated
//!
//! # Customers
//! POST   /api/customers/signup       - Self-registration
//! GET    /api/customers/verify/{token} - Email verification
//! GET    /api/customers/one/{id}     - Manager
//! GET    /api/customers/all          - Manager
//! PATCH  /api/customers              - ManagerOrSelf
//! DELETE /api/customers/delete       - ManagerOrSelf
//!
//! # Staff
//! GET    /api/managers/all           - Executive
//! POST   /api/managers/create        - Executive
//! POST   /api/executives/create      - ExecutiveOrDev
//! ```

pub mod customers;
pub mod executives;
pub mod managers;
pub mod user;

use axum::{Json, Router, routing::get};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::error::AppError;
use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Build the application router over a session store.
///
/// Production passes the `PostgreSQL` store; tests pass `MemoryStore`.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config());

    Router::new()
        .route("/health", get(health))
        .nest("/api/user", user::routes(&state))
        .nest("/api/customers", customers::routes(&state))
        .nest("/api/managers", managers::routes(&state))
        .nest("/api/executives", executives::routes(&state))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Deserialize a request body, reporting shape errors as 400.
///
/// axum's `Json` rejects well-formed JSON of the wrong shape with 422; this
/// API answers every invalid body with 400.
fn parse_body<T: DeserializeOwned>(Json(body): Json<Value>) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// `{"success": message}`
fn success(message: &str) -> Json<Value> {
    Json(serde_json::json!({ "success": message }))
}

/// `{"info": message}`
fn info(message: &str) -> Json<Value> {
    Json(serde_json::json!({ "info": message }))
}
