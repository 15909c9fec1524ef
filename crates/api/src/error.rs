//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server errors are captured to
//! Sentry before a JSON `{"error": ...}` body is sent; internal details never
//! reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use loyalty_core::UserId;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication or account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A session names a user that exists in no variant store.
    #[error("Session references unknown user {0}")]
    OrphanedSession(UserId),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Session(_) | Self::OrphanedSession(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::Login(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidPhone(_)
                | AuthError::MissingContact(_)
                | AuthError::InvalidBirthday(_)
                | AuthError::Validation(_)
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::AlreadyExists(_) => StatusCode::CONFLICT,
                AuthError::TokenNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::Credential(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the client.
    fn client_message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::Login(_) => "Invalid credentials".to_string(),
                AuthError::TokenNotFound => "Customer not found".to_string(),
                AuthError::AlreadyExists(msg) | AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Repository(_) | AuthError::Credential(_) => INTERNAL_MESSAGE.to_string(),
                other => other.to_string(),
            },
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Database(_) | Self::Session(_) | Self::OrphanedSession(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            if let Self::OrphanedSession(user_id) = &self {
                tracing::error!(
                    user_id = %user_id,
                    sentry_event_id = %event_id,
                    "Orphaned session: user id not found in any variant store"
                );
            } else {
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );
            }
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use loyalty_core::EmailError;

    use super::*;
    use crate::services::auth::LoginFailure;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Customer".to_string());
        assert_eq!(err.to_string(), "Not found: Customer");

        let id = UserId::generate();
        let err = AppError::OrphanedSession(id);
        assert_eq!(err.to_string(), format!("Session references unknown user {id}"));
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::OrphanedSession(UserId::generate()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Auth(AuthError::AlreadyExists("Email already exists".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidEmail(EmailError::AtSymbol)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Auth(AuthError::TokenNotFound).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        for reason in [
            LoginFailure::UnknownHandle,
            LoginFailure::WrongSecret,
            LoginFailure::AccountNotVerified,
        ] {
            let (status, body) = body_json(AppError::Auth(AuthError::Login(reason))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "error": "Invalid credentials" }));
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row 7".into()));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));

        let (_, body) = body_json(AppError::OrphanedSession(UserId::generate())).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
