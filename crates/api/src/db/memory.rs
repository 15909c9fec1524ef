//! In-memory user directory for tests and local demos.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::RwLock;

use loyalty_core::{UserId, UserVariant};

use super::{RepositoryError, UserDirectory};
use crate::models::{CustomerUpdate, Identity, NewIdentity, StoredCredentials};

struct Record {
    identity: Identity,
    password_hash: String,
}

/// A [`UserDirectory`] backed by a map behind a tokio `RwLock`.
///
/// Enforces the same per-variant uniqueness of username and phone as the
/// Postgres tables.
#[derive(Default)]
pub struct MemoryUserDirectory {
    records: RwLock<HashMap<UserId, Record>>,
}

impl MemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Check username and phone uniqueness within `identity`'s variant, ignoring `identity` itself.
fn check_unique(records: &HashMap<UserId, Record>, identity: &Identity) -> Result<(), RepositoryError> {
    let profile = identity.profile();
    let phone = profile.contact.phone();
    for record in records.values() {
        let other = &record.identity;
        if other.variant() != identity.variant() || other.id() == identity.id() {
            continue;
        }
        if other.profile().username == profile.username {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }
        if phone.is_some() && other.profile().contact.phone() == phone {
            return Err(RepositoryError::Conflict("phone already exists".to_owned()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(
        &self,
        variant: UserVariant,
        id: UserId,
    ) -> Result<Option<Identity>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .get(&id)
            .filter(|r| r.identity.variant() == variant)
            .map(|r| r.identity.clone()))
    }

    async fn find_by_login_handle(
        &self,
        variant: UserVariant,
        handle: &str,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let records = self.records.read().await;
        let found = records
            .values()
            .find(|r| r.identity.variant() == variant && r.identity.profile().username == handle)
            .or_else(|| {
                records.values().find(|r| {
                    r.identity.variant() == variant
                        && r.identity
                            .profile()
                            .contact
                            .phone()
                            .is_some_and(|phone| phone.as_str() == handle)
                })
            });

        Ok(found.map(|r| StoredCredentials {
            identity: r.identity.clone(),
            password_hash: SecretString::from(r.password_hash.clone()),
        }))
    }

    async fn list(&self, variant: UserVariant) -> Result<Vec<Identity>, RepositoryError> {
        let records = self.records.read().await;
        let mut identities: Vec<Identity> = records
            .values()
            .filter(|r| r.identity.variant() == variant)
            .map(|r| r.identity.clone())
            .collect();
        identities.sort_by_key(|i| (i.profile().created_at, i.id()));
        Ok(identities)
    }

    async fn insert(&self, new: NewIdentity) -> Result<Identity, RepositoryError> {
        let (identity, password_hash) = new.into_identity(UserId::generate(), Utc::now());

        let mut records = self.records.write().await;
        check_unique(&records, &identity)?;
        records.insert(
            identity.id(),
            Record {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    async fn redeem_verify_token(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        let mut records = self.records.write().await;
        for record in records.values_mut() {
            if let Identity::Customer(customer) = &mut record.identity
                && customer.verify_token.as_deref() == Some(token)
            {
                customer.verify_token = None;
                customer.profile.active = true;
                return Ok(Some(customer.profile.id));
            }
        }
        Ok(None)
    }

    async fn update_customer(
        &self,
        id: UserId,
        update: &CustomerUpdate,
    ) -> Result<bool, RepositoryError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get(&id) else {
            return Ok(false);
        };
        let Identity::Customer(customer) = &record.identity else {
            return Ok(false);
        };

        let mut customer = customer.clone();
        let mut password_hash = record.password_hash.clone();
        update
            .apply(&mut customer, &mut password_hash)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let updated = Identity::Customer(customer);
        check_unique(&records, &updated)?;

        records.insert(
            id,
            Record {
                identity: updated,
                password_hash,
            },
        );
        Ok(true)
    }

    async fn delete(&self, variant: UserVariant, id: UserId) -> Result<bool, RepositoryError> {
        let mut records = self.records.write().await;
        if records.get(&id).is_some_and(|r| r.identity.variant() == variant) {
            records.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use loyalty_core::{Birthday, ContactInfo, Email, Phone};
    use secrecy::ExposeSecret;

    use super::*;
    use crate::models::{NewKind, NewUser};

    fn staff(kind: NewKind, username: &str, phone: Option<&str>) -> NewIdentity {
        staff_named(kind, username, username, phone)
    }

    fn staff_named(kind: NewKind, username: &str, email: &str, phone: Option<&str>) -> NewIdentity {
        NewIdentity {
            user: NewUser {
                name: username.to_owned(),
                username: username.to_owned(),
                contact: ContactInfo::new(
                    Some(Email::parse(email).unwrap()),
                    phone.map(|p| Phone::parse(p).unwrap()),
                )
                .unwrap(),
                password_hash: format!("hash-of-{username}"),
            },
            kind,
        }
    }

    fn customer(username: &str, token: &str) -> NewIdentity {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        staff(
            NewKind::Customer {
                address: "1 Main St".to_owned(),
                birthday: Birthday::parse("1990-01-01", today).unwrap(),
                verify_token: token.to_owned(),
            },
            username,
            None,
        )
    }

    #[tokio::test]
    async fn test_resolve_any_variant_finds_each_store() {
        let dir = MemoryUserDirectory::new();
        let manager = dir.insert(staff(NewKind::Manager, "m@example.com", None)).await.unwrap();
        let cashier = dir.insert(staff(NewKind::Cashier, "c@example.com", None)).await.unwrap();

        let found = dir.resolve_any_variant(manager.id()).await.unwrap().unwrap();
        assert_eq!(found.variant(), UserVariant::Manager);
        let found = dir.resolve_any_variant(cashier.id()).await.unwrap().unwrap();
        assert_eq!(found.variant(), UserVariant::Cashier);
        assert!(dir.resolve_any_variant(UserId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_id_respects_variant() {
        let dir = MemoryUserDirectory::new();
        let manager = dir.insert(staff(NewKind::Manager, "m@example.com", None)).await.unwrap();
        assert!(
            dir.find_by_id(UserVariant::Executive, manager.id())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_login_handle_prefers_username_over_phone() {
        let dir = MemoryUserDirectory::new();
        // The first manager's phone equals the second manager's username.
        dir.insert(staff(NewKind::Manager, "a@example.com", Some("9095550134")))
            .await
            .unwrap();
        dir.insert(staff_named(NewKind::Manager, "9095550134", "b@example.com", None))
            .await
            .unwrap();

        let found = dir
            .find_by_login_handle(UserVariant::Manager, "9095550134")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.identity.profile().username, "9095550134");
        assert_eq!(found.password_hash.expose_secret(), "hash-of-9095550134");

        let by_phone = dir
            .find_by_login_handle(UserVariant::Manager, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_phone.identity.profile().username, "a@example.com");

        assert!(
            dir.find_by_login_handle(UserVariant::Customer, "a@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_uniqueness_is_per_variant() {
        let dir = MemoryUserDirectory::new();
        dir.insert(staff(NewKind::Manager, "x@example.com", Some("9095550134")))
            .await
            .unwrap();
        // Same username in another variant's store is fine.
        dir.insert(staff(NewKind::Executive, "x@example.com", None)).await.unwrap();

        let dup_name = dir.insert(staff(NewKind::Manager, "x@example.com", None)).await;
        assert!(matches!(dup_name, Err(RepositoryError::Conflict(_))));
        let dup_phone = dir
            .insert(staff(NewKind::Manager, "y@example.com", Some("9095550134")))
            .await;
        assert!(matches!(dup_phone, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_verify_token_is_single_use() {
        let dir = MemoryUserDirectory::new();
        let created = dir.insert(customer("cust@example.com", "abc123")).await.unwrap();
        assert!(!created.is_active());

        assert_eq!(dir.redeem_verify_token("abc123").await.unwrap(), Some(created.id()));
        assert_eq!(dir.redeem_verify_token("abc123").await.unwrap(), None);

        let stored = dir
            .find_by_id(UserVariant::Customer, created.id())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_active());
        assert!(stored.as_customer().unwrap().verify_token.is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_customer() {
        let dir = MemoryUserDirectory::new();
        let created = dir.insert(customer("cust@example.com", "t")).await.unwrap();
        let update = CustomerUpdate {
            name: Some("Renamed".to_owned()),
            ..CustomerUpdate::default()
        };

        assert!(dir.update_customer(created.id(), &update).await.unwrap());
        assert!(!dir.update_customer(UserId::generate(), &update).await.unwrap());
        let stored = dir.resolve_any_variant(created.id()).await.unwrap().unwrap();
        assert_eq!(stored.profile().name, "Renamed");

        assert!(!dir.delete(UserVariant::Manager, created.id()).await.unwrap());
        assert!(dir.delete(UserVariant::Customer, created.id()).await.unwrap());
        assert!(!dir.delete(UserVariant::Customer, created.id()).await.unwrap());
    }
}
