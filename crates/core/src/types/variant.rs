//! User variants and capability ranks.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The concrete role of an identity.
///
/// The variant is fixed when an identity is created; no operation changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserVariant {
    /// Self-registered loyalty member.
    Customer,
    /// Store manager; administers customers.
    Manager,
    /// Chain owner; administers managers and everything a manager can.
    Executive,
    /// Point-of-sale staff. Reserved for per-store scoping.
    Cashier,
}

/// Capability rank of a variant.
///
/// Ranks are totally ordered: `Customer < Cashier < Manager < Executive`.
/// A predicate that requires "at least manager" is a rank comparison, so an
/// executive satisfies every manager check without any special casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Customer,
    Cashier,
    Manager,
    Executive,
}

/// Error returned for an unknown variant name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown user type: {0}")]
pub struct ParseVariantError(String);

impl UserVariant {
    /// Every variant in the order identity resolution probes their stores.
    ///
    /// Variants live in separate stores sharing one id space, so resolving a
    /// bare id means asking each store in turn, first hit wins.
    pub const PROBE_ORDER: [Self; 4] = [Self::Customer, Self::Manager, Self::Executive, Self::Cashier];

    /// Capability rank of this variant.
    #[must_use]
    pub const fn rank(self) -> Rank {
        match self {
            Self::Customer => Rank::Customer,
            Self::Cashier => Rank::Cashier,
            Self::Manager => Rank::Manager,
            Self::Executive => Rank::Executive,
        }
    }

    /// Whether this variant has at least the capabilities of `other`.
    #[must_use]
    pub fn at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Canonical name, as used in the `type` tag of serialized identities.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Manager => "Manager",
            Self::Executive => "Executive",
            Self::Cashier => "Cashier",
        }
    }

    /// Whether identities of this variant start out active.
    ///
    /// Customers must verify their email first; staff accounts are created
    /// by someone who already vouches for them.
    #[must_use]
    pub const fn active_on_creation(self) -> bool {
        !matches!(self, Self::Customer)
    }
}

impl fmt::Display for UserVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserVariant {
    type Err = ParseVariantError;

    /// Parse a variant name, ignoring ASCII case (`/login/manager` and
    /// `/login/Manager` are the same route).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PROBE_ORDER
            .into_iter()
            .find(|variant| variant.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseVariantError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_executive_outranks_manager() {
        assert!(UserVariant::Executive.at_least(UserVariant::Manager));
        assert!(UserVariant::Manager.at_least(UserVariant::Manager));
        assert!(!UserVariant::Cashier.at_least(UserVariant::Manager));
        assert!(!UserVariant::Customer.at_least(UserVariant::Manager));
    }

    #[test]
    fn test_every_variant_ranks_at_least_itself() {
        for variant in UserVariant::PROBE_ORDER {
            assert!(variant.at_least(variant));
        }
    }

    #[test]
    fn test_probe_order_starts_with_customer() {
        assert_eq!(
            UserVariant::PROBE_ORDER,
            [
                UserVariant::Customer,
                UserVariant::Manager,
                UserVariant::Executive,
                UserVariant::Cashier
            ]
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("manager".parse::<UserVariant>().unwrap(), UserVariant::Manager);
        assert_eq!("EXECUTIVE".parse::<UserVariant>().unwrap(), UserVariant::Executive);
        assert_eq!("Customer".parse::<UserVariant>().unwrap(), UserVariant::Customer);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("owner".parse::<UserVariant>().is_err());
        assert!("".parse::<UserVariant>().is_err());
    }

    #[test]
    fn test_only_customers_start_inactive() {
        assert!(!UserVariant::Customer.active_on_creation());
        assert!(UserVariant::Manager.active_on_creation());
        assert!(UserVariant::Executive.active_on_creation());
        assert!(UserVariant::Cashier.active_on_creation());
    }
}
