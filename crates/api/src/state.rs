//! Application state shared across handlers.

use std::sync::Arc;

use loyalty_core::UserVariant;

use crate::authz::BreakGlass;
use crate::config::ApiConfig;
use crate::db::{UserDirectory, VariantDirectory};
use crate::services::auth::{AuthService, CredentialVerifier};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The configuration inside is
/// immutable after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    directory: Arc<dyn UserDirectory>,
    verifier: CredentialVerifier,
    break_glass: BreakGlass,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The break-glass capability is derived from `config` here, once.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        directory: Arc<dyn UserDirectory>,
        verifier: CredentialVerifier,
    ) -> Self {
        let break_glass = BreakGlass::from_config(&config.break_glass);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                directory,
                verifier,
                break_glass,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get the user directory spanning every variant.
    #[must_use]
    pub fn directory(&self) -> &dyn UserDirectory {
        self.inner.directory.as_ref()
    }

    /// Get the directory for a single variant's store.
    #[must_use]
    pub fn directory_for(&self, variant: UserVariant) -> VariantDirectory<'_> {
        VariantDirectory::new(self.directory(), variant)
    }

    #[must_use]
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.inner.verifier
    }

    #[must_use]
    pub fn break_glass(&self) -> &BreakGlass {
        &self.inner.break_glass
    }

    /// Authentication service over this state's directory and verifier.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.directory(), self.verifier())
    }
}
