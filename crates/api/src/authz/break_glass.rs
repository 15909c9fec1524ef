//! Break-glass override.
//!
//! A shared secret from configuration that lets a caller with no session
//! create the first executive. It is only consulted by the `Dev` predicates,
//! is off unless `LOYALTY_BREAK_GLASS_ENABLED` is set, and is compiled out
//! entirely without the `break-glass` cargo feature.

use secrecy::SecretString;

use crate::config::BreakGlassConfig;

#[cfg(feature = "break-glass")]
use hmac::{Hmac, Mac};
#[cfg(feature = "break-glass")]
use secrecy::ExposeSecret;
#[cfg(feature = "break-glass")]
use sha2::Sha256;

#[cfg(feature = "break-glass")]
type HmacSha256 = Hmac<Sha256>;

/// Message both sides MAC. Candidate and configured secret are used as keys,
/// so the comparison is between fixed-length tags.
#[cfg(feature = "break-glass")]
const DOMAIN: &[u8] = b"loyalty-break-glass-v1";

/// The break-glass capability.
///
/// Implements `Debug` manually so the derived tag never reaches logs.
#[derive(Clone, Default)]
pub struct BreakGlass {
    #[cfg(feature = "break-glass")]
    expected: Option<Vec<u8>>,
}

impl BreakGlass {
    /// A capability that never matches.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            #[cfg(feature = "break-glass")]
            expected: None,
        }
    }

    /// Build from configuration.
    #[cfg(feature = "break-glass")]
    #[must_use]
    pub fn from_config(config: &BreakGlassConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let expected = config.secret.as_ref().and_then(|secret| {
            HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
                .ok()
                .map(|mac| mac.chain_update(DOMAIN).finalize().into_bytes().to_vec())
        });
        if expected.is_some() {
            tracing::warn!("Break-glass override is enabled");
        }
        Self { expected }
    }

    /// Build from configuration.
    #[cfg(not(feature = "break-glass"))]
    #[must_use]
    pub fn from_config(config: &BreakGlassConfig) -> Self {
        if config.enabled {
            tracing::warn!("LOYALTY_BREAK_GLASS_ENABLED is set but break-glass support is not compiled in");
        }
        Self::disabled()
    }

    /// Whether any secret can match.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        #[cfg(feature = "break-glass")]
        {
            self.expected.is_some()
        }
        #[cfg(not(feature = "break-glass"))]
        {
            false
        }
    }

    /// Constant-time check of a submitted secret.
    #[cfg(feature = "break-glass")]
    #[must_use]
    pub fn matches(&self, candidate: Option<&SecretString>) -> bool {
        let (Some(expected), Some(candidate)) = (&self.expected, candidate) else {
            return false;
        };
        HmacSha256::new_from_slice(candidate.expose_secret().as_bytes())
            .is_ok_and(|mac| mac.chain_update(DOMAIN).verify_slice(expected).is_ok())
    }

    /// Constant-time check of a submitted secret.
    #[cfg(not(feature = "break-glass"))]
    #[must_use]
    pub const fn matches(&self, _candidate: Option<&SecretString>) -> bool {
        false
    }
}

impl std::fmt::Debug for BreakGlass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakGlass")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "break-glass"))]
mod tests {
    use super::*;

    const SECRET: &str = "Zq8#vN2!pL5@wR9$kT4%mB7^cX1&hF6*";

    fn config(enabled: bool) -> BreakGlassConfig {
        BreakGlassConfig {
            enabled,
            secret: Some(SecretString::from(SECRET)),
        }
    }

    #[test]
    fn test_matches_only_the_configured_secret() {
        let bg = BreakGlass::from_config(&config(true));
        assert!(bg.is_enabled());
        assert!(bg.matches(Some(&SecretString::from(SECRET))));
        assert!(!bg.matches(Some(&SecretString::from("Zq8#vN2!pL5@wR9$kT4%mB7^cX1&hF6"))));
        assert!(!bg.matches(Some(&SecretString::from(""))));
        assert!(!bg.matches(None));
    }

    #[test]
    fn test_runtime_flag_off_never_matches() {
        let bg = BreakGlass::from_config(&config(false));
        assert!(!bg.is_enabled());
        assert!(!bg.matches(Some(&SecretString::from(SECRET))));
        assert!(!BreakGlass::disabled().matches(Some(&SecretString::from(SECRET))));
    }

    #[test]
    fn test_debug_hides_tag() {
        let output = format!("{:?}", BreakGlass::from_config(&config(true)));
        assert_eq!(output, "BreakGlass { enabled: true, .. }");
    }
}
