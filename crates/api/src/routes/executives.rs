//! Executive creation. Also reachable with the break-glass secret so the
//! first executive can be made before anyone can log in.

use axum::{
    Extension, Json, Router, extract::State, http::StatusCode, response::IntoResponse,
    routing::post,
};
use serde_json::Value;

use loyalty_core::{UserId, UserVariant};

use super::{parse_body, success};
use crate::authz::Predicate;
use crate::error::Result;
use crate::middleware::{ResolvedIdentity, guarded};
use crate::models::{Identity, StaffSignup};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new().route("/create", guarded(post(create), state, Predicate::ExecutiveOrDev))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ResolvedIdentity(caller)): Extension<ResolvedIdentity>,
    body: Json<Value>,
) -> Result<impl IntoResponse> {
    let signup: StaffSignup = parse_body(body)?;
    let executive = state.auth().create_staff(UserVariant::Executive, signup).await?;

    match Creator::of(caller.as_deref()) {
        Creator::Executive(by) => {
            tracing::info!(user_id = %executive.id(), created_by = %by, "Executive created");
        }
        Creator::BreakGlass { session: Some(by) } => {
            tracing::warn!(
                user_id = %executive.id(),
                caller = %by,
                "Executive created with break-glass override"
            );
        }
        Creator::BreakGlass { session: None } => {
            tracing::warn!(user_id = %executive.id(), "Executive created with break-glass override");
        }
    }
    Ok((StatusCode::CREATED, success("Executive created.")))
}

/// Who let an executive creation through the guard.
#[derive(Debug, PartialEq, Eq)]
enum Creator {
    Executive(UserId),
    /// The override secret. `session` is the caller's id when they were
    /// logged in as someone else.
    BreakGlass { session: Option<UserId> },
}

impl Creator {
    fn of(caller: Option<&Identity>) -> Self {
        match caller {
            Some(c) if c.variant() == UserVariant::Executive => Self::Executive(c.id()),
            other => Self::BreakGlass {
                session: other.map(Identity::id),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use loyalty_core::{ContactInfo, Email};

    use super::*;
    use crate::models::{NewIdentity, NewKind, NewUser};

    fn staff(kind: NewKind) -> Identity {
        let new = NewIdentity {
            user: NewUser {
                name: "Staff".to_owned(),
                username: "staff@example.com".to_owned(),
                contact: ContactInfo::new(Some(Email::parse("staff@example.com").unwrap()), None)
                    .unwrap(),
                password_hash: String::new(),
            },
            kind,
        };
        new.into_identity(UserId::generate(), Utc::now()).0
    }

    #[test]
    fn test_executive_caller_is_recorded() {
        let exec = staff(NewKind::Executive);
        assert_eq!(Creator::of(Some(&exec)), Creator::Executive(exec.id()));
    }

    #[test]
    fn test_break_glass_keeps_non_executive_caller() {
        let manager = staff(NewKind::Manager);
        assert_eq!(
            Creator::of(Some(&manager)),
            Creator::BreakGlass {
                session: Some(manager.id())
            }
        );
        assert_eq!(Creator::of(None), Creator::BreakGlass { session: None });
    }
}
