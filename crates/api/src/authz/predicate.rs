//! Authorization predicates.

use secrecy::SecretString;

use loyalty_core::UserVariant;

use super::{BreakGlass, Decision, Denial, OwnerId};
use crate::models::Identity;

/// Everything a predicate may look at.
#[derive(Clone, Copy)]
pub struct AccessRequest<'a> {
    /// The session's identity, `None` when there is no session.
    pub identity: Option<&'a Identity>,
    /// The owner id named by the request.
    pub owner: OwnerId,
    /// The `devSecret` body field.
    pub dev_secret: Option<&'a SecretString>,
    pub break_glass: &'a BreakGlass,
}

/// A named authorization check a route is guarded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// An active session.
    Authenticated,
    /// The caller is the owner named by the request.
    SelfOwner,
    Customer,
    /// Manager rank or above, so executives pass too.
    Manager,
    Executive,
    /// Break-glass secret matches. Independent of any session.
    Dev,
    ManagerOrSelf,
    ExecutiveOrSelf,
    ExecutiveOrDev,
}

impl Predicate {
    /// Evaluate the predicate. Total: never fails, only allows or denies.
    #[must_use]
    pub fn evaluate(self, request: &AccessRequest<'_>) -> Decision {
        match self {
            Self::Authenticated => authenticated(request).map(|_| ()).into(),
            Self::SelfOwner => is_owner(request).into(),
            Self::Customer => has_variant(request, UserVariant::Customer).into(),
            Self::Manager => at_least(request, UserVariant::Manager).into(),
            Self::Executive => has_variant(request, UserVariant::Executive).into(),
            Self::Dev => {
                if request.break_glass.matches(request.dev_secret) {
                    Decision::Allow
                } else {
                    Decision::Deny(Denial::Unauthenticated)
                }
            }
            Self::ManagerOrSelf => {
                Self::Manager.evaluate(request).or_else(|| Self::SelfOwner.evaluate(request))
            }
            Self::ExecutiveOrSelf => {
                Self::Executive.evaluate(request).or_else(|| Self::SelfOwner.evaluate(request))
            }
            Self::ExecutiveOrDev => {
                Self::Executive.evaluate(request).or_else(|| Self::Dev.evaluate(request))
            }
        }
    }

    /// Whether evaluation reads the request's owner id.
    #[must_use]
    pub const fn needs_owner(self) -> bool {
        matches!(self, Self::SelfOwner | Self::ManagerOrSelf | Self::ExecutiveOrSelf)
    }

    /// Whether evaluation reads the break-glass secret.
    #[must_use]
    pub const fn needs_dev_secret(self) -> bool {
        matches!(self, Self::Dev | Self::ExecutiveOrDev)
    }
}

/// 401 without a session, 403 for an inactive account.
fn authenticated<'a>(request: &AccessRequest<'a>) -> Result<&'a Identity, Denial> {
    let identity = request.identity.ok_or(Denial::Unauthenticated)?;
    if !identity.is_active() {
        return Err(Denial::Forbidden);
    }
    Ok(identity)
}

fn has_variant(request: &AccessRequest<'_>, variant: UserVariant) -> Result<(), Denial> {
    if authenticated(request)?.variant() == variant {
        Ok(())
    } else {
        Err(Denial::Forbidden)
    }
}

fn at_least(request: &AccessRequest<'_>, variant: UserVariant) -> Result<(), Denial> {
    if authenticated(request)?.variant().at_least(variant) {
        Ok(())
    } else {
        Err(Denial::Forbidden)
    }
}

fn is_owner(request: &AccessRequest<'_>) -> Result<(), Denial> {
    let identity = authenticated(request)?;
    match request.owner {
        OwnerId::Present(owner) if owner == identity.id() => Ok(()),
        OwnerId::Present(_) | OwnerId::Absent => Err(Denial::Forbidden),
        OwnerId::Conflict | OwnerId::Malformed => Err(Denial::InvalidOwner),
    }
}
