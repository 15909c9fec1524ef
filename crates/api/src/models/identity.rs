//! The polymorphic identity model.
//!
//! An [`Identity`] is exactly one of four variants. Every variant carries a
//! shared [`UserProfile`]; the variant tag itself is fixed at creation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use loyalty_core::{
    Birthday, ChainId, CommentId, ContactError, ContactInfo, Email, Phone, PromotionId,
    StoreId, TransactionId, UserId, UserVariant,
};

/// Geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A store near a customer, as computed by the geocoding collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyStore {
    pub coordinates: Coordinates,
    pub distance_miles: f64,
}

/// Attributes shared by every identity variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub active: bool,
    pub name: String,
    /// Login handle, unique within the variant's store.
    pub username: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub comments: Vec<CommentId>,
    pub created_at: DateTime<Utc>,
}

/// A self-registered loyalty member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub address: String,
    pub address_coords: Option<Coordinates>,
    pub birthday: Birthday,
    pub preferences: Vec<String>,
    pub transaction_history: Vec<TransactionId>,
    pub credits: u32,
    pub promotions: Vec<PromotionId>,
    pub nearest_stores: BTreeMap<StoreId, NearbyStore>,
    /// Present only until the account is activated.
    #[serde(skip)]
    pub verify_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub added_accounts: Vec<UserId>,
    pub replied_comments: Vec<CommentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Executive {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub chain: Option<ChainId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cashier {
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// A resolved user of one of the four variants.
///
/// Serializes with a `type` tag naming the variant and the profile fields
/// inlined, e.g. `{"type":"Manager","_id":"…","active":true,…}`. The
/// password hash is never part of an `Identity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Identity {
    Customer(Customer),
    Manager(Manager),
    Executive(Executive),
    Cashier(Cashier),
}

impl Identity {
    #[must_use]
    pub const fn variant(&self) -> UserVariant {
        match self {
            Self::Customer(_) => UserVariant::Customer,
            Self::Manager(_) => UserVariant::Manager,
            Self::Executive(_) => UserVariant::Executive,
            Self::Cashier(_) => UserVariant::Cashier,
        }
    }

    #[must_use]
    pub const fn profile(&self) -> &UserProfile {
        match self {
            Self::Customer(c) => &c.profile,
            Self::Manager(m) => &m.profile,
            Self::Executive(e) => &e.profile,
            Self::Cashier(c) => &c.profile,
        }
    }

    pub const fn profile_mut(&mut self) -> &mut UserProfile {
        match self {
            Self::Customer(c) => &mut c.profile,
            Self::Manager(m) => &mut m.profile,
            Self::Executive(e) => &mut e.profile,
            Self::Cashier(c) => &mut c.profile,
        }
    }

    #[must_use]
    pub const fn id(&self) -> UserId {
        self.profile().id
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.profile().active
    }

    #[must_use]
    pub const fn as_customer(&self) -> Option<&Customer> {
        match self {
            Self::Customer(c) => Some(c),
            _ => None,
        }
    }
}

/// An identity together with its password hash, as returned by login lookups.
#[derive(Debug)]
pub struct StoredCredentials {
    pub identity: Identity,
    pub password_hash: SecretString,
}

/// Attributes common to every new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub contact: ContactInfo,
    pub password_hash: String,
}

/// Variant-specific part of a new account.
#[derive(Debug, Clone)]
pub enum NewKind {
    Customer {
        address: String,
        birthday: Birthday,
        verify_token: String,
    },
    Manager,
    Executive,
    Cashier,
}

/// A validated account ready to be stored.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub user: NewUser,
    pub kind: NewKind,
}

impl NewIdentity {
    #[must_use]
    pub const fn variant(&self) -> UserVariant {
        match self.kind {
            NewKind::Customer { .. } => UserVariant::Customer,
            NewKind::Manager => UserVariant::Manager,
            NewKind::Executive => UserVariant::Executive,
            NewKind::Cashier => UserVariant::Cashier,
        }
    }

    /// Build the stored identity with freshly assigned id and timestamp.
    ///
    /// Returns the identity and the password hash to persist next to it.
    #[must_use]
    pub fn into_identity(self, id: UserId, created_at: DateTime<Utc>) -> (Identity, String) {
        let variant = self.variant();
        let NewUser {
            name,
            username,
            contact,
            password_hash,
        } = self.user;
        let profile = UserProfile {
            id,
            active: variant.active_on_creation(),
            name,
            username,
            contact,
            comments: Vec::new(),
            created_at,
        };

        let identity = match self.kind {
            NewKind::Customer {
                address,
                birthday,
                verify_token,
            } => Identity::Customer(Customer {
                profile,
                address,
                address_coords: None,
                birthday,
                preferences: Vec::new(),
                transaction_history: Vec::new(),
                credits: 0,
                promotions: Vec::new(),
                nearest_stores: BTreeMap::new(),
                verify_token: Some(verify_token),
            }),
            NewKind::Manager => Identity::Manager(Manager {
                profile,
                added_accounts: Vec::new(),
                replied_comments: Vec::new(),
            }),
            NewKind::Executive => Identity::Executive(Executive {
                profile,
                chain: None,
            }),
            NewKind::Cashier => Identity::Cashier(Cashier { profile }),
        };
        (identity, password_hash)
    }
}

/// A validated partial update of a customer.
///
/// A customer's username mirrors their email, so a new email also becomes
/// the new username.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
    pub address: Option<String>,
    pub birthday: Option<Birthday>,
    pub password_hash: Option<String>,
    pub preferences: Option<Vec<String>>,
}

impl CustomerUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.birthday.is_none()
            && self.password_hash.is_none()
            && self.preferences.is_none()
    }

    /// Apply the update to an in-memory customer and its password hash.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] if the result would have no contact channel.
    pub fn apply(&self, customer: &mut Customer, password_hash: &mut String) -> Result<(), ContactError> {
        let profile = &mut customer.profile;
        if let Some(email) = &self.email {
            profile.contact = profile.contact.with_email(Some(email.clone()))?;
            profile.username = email.as_str().to_owned();
        }
        if let Some(phone) = &self.phone {
            profile.contact = profile.contact.with_phone(Some(phone.clone()))?;
        }
        if let Some(name) = &self.name {
            profile.name.clone_from(name);
        }
        if let Some(address) = &self.address {
            customer.address.clone_from(address);
        }
        if let Some(birthday) = self.birthday {
            customer.birthday = birthday;
        }
        if let Some(preferences) = &self.preferences {
            customer.preferences.clone_from(preferences);
        }
        if let Some(hash) = &self.password_hash {
            password_hash.clone_from(hash);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_customer() -> NewIdentity {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        NewIdentity {
            user: NewUser {
                name: "Ada".to_owned(),
                username: "ada@example.com".to_owned(),
                contact: ContactInfo::new(Some(Email::parse("ada@example.com").unwrap()), None)
                    .unwrap(),
                password_hash: "$argon2id$stub".to_owned(),
            },
            kind: NewKind::Customer {
                address: "1 Main St".to_owned(),
                birthday: Birthday::parse("1990-01-01", today).unwrap(),
                verify_token: "00ff".to_owned(),
            },
        }
    }

    #[test]
    fn test_customer_starts_inactive_with_token() {
        let (identity, hash) = new_customer().into_identity(UserId::generate(), Utc::now());
        assert_eq!(identity.variant(), UserVariant::Customer);
        assert!(!identity.is_active());
        assert_eq!(hash, "$argon2id$stub");
        assert_eq!(
            identity.as_customer().unwrap().verify_token.as_deref(),
            Some("00ff")
        );
    }

    #[test]
    fn test_staff_start_active() {
        let mut new = new_customer();
        new.kind = NewKind::Manager;
        let (identity, _) = new.into_identity(UserId::generate(), Utc::now());
        assert_eq!(identity.variant(), UserVariant::Manager);
        assert!(identity.is_active());
    }

    #[test]
    fn test_serialization_is_tagged_and_hides_secrets() {
        let id = UserId::generate();
        let (identity, _) = new_customer().into_identity(id, Utc::now());
        let json = serde_json::to_value(&identity).unwrap();

        assert_eq!(json["type"], "Customer");
        assert_eq!(json["_id"], id.to_string());
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["credits"], 0);
        assert!(json.get("phone").is_none());
        assert!(json.get("verifyToken").is_none());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_update_email_moves_username() {
        let (identity, mut hash) = new_customer().into_identity(UserId::generate(), Utc::now());
        let Identity::Customer(mut customer) = identity else {
            panic!("expected customer");
        };
        let update = CustomerUpdate {
            email: Some(Email::parse("lovelace@example.com").unwrap()),
            preferences: Some(vec!["coffee".to_owned()]),
            ..CustomerUpdate::default()
        };
        update.apply(&mut customer, &mut hash).unwrap();

        assert_eq!(customer.profile.username, "lovelace@example.com");
        assert_eq!(customer.preferences, vec!["coffee".to_owned()]);
        assert_eq!(hash, "$argon2id$stub");
    }

    #[test]
    fn test_empty_update() {
        assert!(CustomerUpdate::default().is_empty());
        let update = CustomerUpdate {
            name: Some("x".to_owned()),
            ..CustomerUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
