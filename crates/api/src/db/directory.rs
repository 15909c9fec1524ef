//! The user directory: identity storage partitioned by variant.

use async_trait::async_trait;

use loyalty_core::{UserId, UserVariant};

use super::RepositoryError;
use crate::models::{CustomerUpdate, Identity, NewIdentity, StoredCredentials};

/// Storage for all identity variants.
///
/// Each variant lives in its own store. Ids are unique across all of them,
/// so [`resolve_any_variant`](Self::resolve_any_variant) can find a user
/// from nothing but the id held in a session.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up an identity in one variant's store.
    async fn find_by_id(
        &self,
        variant: UserVariant,
        id: UserId,
    ) -> Result<Option<Identity>, RepositoryError>;

    /// Look up login credentials by username or phone.
    ///
    /// When one record matches by username and another by phone, the
    /// username match wins.
    async fn find_by_login_handle(
        &self,
        variant: UserVariant,
        handle: &str,
    ) -> Result<Option<StoredCredentials>, RepositoryError>;

    /// List every identity of a variant, oldest first.
    async fn list(&self, variant: UserVariant) -> Result<Vec<Identity>, RepositoryError>;

    /// Store a new identity and return it as stored.
    ///
    /// Returns `RepositoryError::Conflict` when the username or phone is
    /// already taken within the variant's store.
    async fn insert(&self, new: NewIdentity) -> Result<Identity, RepositoryError>;

    /// Activate the customer holding `token` and clear the token.
    ///
    /// Returns `None` when no customer holds it, which includes a token that
    /// was already redeemed.
    async fn redeem_verify_token(&self, token: &str) -> Result<Option<UserId>, RepositoryError>;

    /// Apply a partial update to a customer. Returns whether a customer was updated.
    async fn update_customer(
        &self,
        id: UserId,
        update: &CustomerUpdate,
    ) -> Result<bool, RepositoryError>;

    /// Delete an identity from a variant's store. Returns whether one was deleted.
    async fn delete(&self, variant: UserVariant, id: UserId) -> Result<bool, RepositoryError>;

    /// Find an identity without knowing its variant.
    ///
    /// Probes the stores in [`UserVariant::PROBE_ORDER`] and returns the first hit.
    async fn resolve_any_variant(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
        for variant in UserVariant::PROBE_ORDER {
            if let Some(identity) = self.find_by_id(variant, id).await? {
                return Ok(Some(identity));
            }
        }
        Ok(None)
    }
}

/// A view of the directory restricted to one variant's store.
#[derive(Clone, Copy)]
pub struct VariantDirectory<'a> {
    directory: &'a dyn UserDirectory,
    variant: UserVariant,
}

impl<'a> VariantDirectory<'a> {
    #[must_use]
    pub const fn new(directory: &'a dyn UserDirectory, variant: UserVariant) -> Self {
        Self { directory, variant }
    }

    #[must_use]
    pub const fn variant(&self) -> UserVariant {
        self.variant
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
        self.directory.find_by_id(self.variant, id).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn find_by_login_handle(
        &self,
        handle: &str,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        self.directory.find_by_login_handle(self.variant, handle).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Identity>, RepositoryError> {
        self.directory.list(self.variant).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be written.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        self.directory.delete(self.variant, id).await
    }
}
