//! Authorization engine.
//!
//! Predicates are pure functions of an [`AccessRequest`]: the resolved
//! identity (if any), the owner id the request targets, and an optional
//! break-glass secret. They never touch the session, the directory or the
//! environment. The HTTP adapter that feeds them lives in
//! [`crate::middleware::guard`].
//!
//! # Status precedence
//!
//! Every denial carries one of three statuses, ordered
//! `Unauthenticated < Forbidden < InvalidOwner`. Composite predicates
//! short-circuit on the first allowing branch; when all branches deny, the
//! strongest denial wins. An anonymous caller therefore always sees 401 and an
//! authenticated caller who lacks the capability sees 403.

mod break_glass;
mod owner;
mod predicate;

pub use break_glass::BreakGlass;
pub use owner::OwnerId;
pub use predicate::{AccessRequest, Predicate};

use axum::http::StatusCode;

/// Why a predicate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Denial {
    /// No session, or a break-glass secret that did not match.
    Unauthenticated,
    /// Authenticated but lacking the capability or ownership.
    Forbidden,
    /// The request names its target owner ambiguously or unparseably.
    InvalidOwner,
}

impl Denial {
    /// HTTP status sent for this denial.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidOwner => StatusCode::BAD_REQUEST,
        }
    }
}

/// Outcome of evaluating a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Allow if either decision allows, otherwise keep the stronger denial.
    #[must_use]
    pub fn or_else(self, other: impl FnOnce() -> Self) -> Self {
        match self {
            Self::Allow => Self::Allow,
            Self::Deny(first) => match other() {
                Self::Allow => Self::Allow,
                Self::Deny(second) => Self::Deny(first.max(second)),
            },
        }
    }
}

impl From<Result<(), Denial>> for Decision {
    fn from(result: Result<(), Denial>) -> Self {
        result.map_or_else(Self::Deny, |()| Self::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_statuses() {
        assert_eq!(Denial::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Denial::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(Denial::InvalidOwner.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_or_else_keeps_strongest_denial() {
        let unauth = Decision::Deny(Denial::Unauthenticated);
        let forbidden = Decision::Deny(Denial::Forbidden);

        assert_eq!(unauth.or_else(|| forbidden), forbidden);
        assert_eq!(forbidden.or_else(|| unauth), forbidden);
        assert_eq!(unauth.or_else(|| Decision::Allow), Decision::Allow);
    }

    #[test]
    fn test_or_else_short_circuits() {
        let decision = Decision::Allow.or_else(|| unreachable!("second branch evaluated"));
        assert!(decision.is_allowed());
    }
}
