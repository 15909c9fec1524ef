//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LOYALTY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `LOYALTY_BASE_URL` - Public URL of the web client (verification redirects land here)
//!
//! ## Optional
//! - `LOYALTY_HOST` - Bind address (default: 127.0.0.1)
//! - `LOYALTY_PORT` - Listen port (default: 8080)
//! - `LOYALTY_SESSION_EXPIRY_SECONDS` - Sliding session lifetime (default: 3600)
//! - `LOYALTY_BREAK_GLASS_ENABLED` - Enable the shared-secret override (default: false)
//! - `LOYALTY_BREAK_GLASS_SECRET` - Override secret, required when enabled
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_BREAK_GLASS_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SESSION_EXPIRY_SECONDS: i64 = 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API configuration.
///
/// Built once at startup and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the web client
    pub base_url: Url,
    /// Idle time after which a session expires
    pub session_expiry_seconds: i64,
    /// Break-glass override settings
    pub break_glass: BreakGlassConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Break-glass override settings.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone, Default)]
pub struct BreakGlassConfig {
    /// Whether the override is accepted at runtime
    pub enabled: bool,
    /// Shared secret; always `Some` when `enabled` is true
    pub secret: Option<SecretString>,
}

impl std::fmt::Debug for BreakGlassConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakGlassConfig")
            .field("enabled", &self.enabled)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the break-glass secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LOYALTY_DATABASE_URL")?;
        let host = get_env_or_default("LOYALTY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOYALTY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("LOYALTY_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOYALTY_PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url(&get_required_env("LOYALTY_BASE_URL")?)?;
        let session_expiry_seconds = parse_expiry(get_optional_env(
            "LOYALTY_SESSION_EXPIRY_SECONDS",
        ))?;
        let break_glass = BreakGlassConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_expiry_seconds,
            break_glass,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the client is served over HTTPS (controls the `Secure` cookie flag).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Where a successful email verification sends the browser.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url.as_str().trim_end_matches('/'))
    }
}

impl BreakGlassConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let enabled = match get_optional_env("LOYALTY_BREAK_GLASS_ENABLED") {
            Some(raw) => parse_flag("LOYALTY_BREAK_GLASS_ENABLED", &raw)?,
            None => false,
        };
        if !enabled {
            return Ok(Self::default());
        }

        let secret = get_validated_secret("LOYALTY_BREAK_GLASS_SECRET")?;
        validate_secret_length(&secret, "LOYALTY_BREAK_GLASS_SECRET")?;
        Ok(Self {
            enabled,
            secret: Some(secret),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("LOYALTY_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "LOYALTY_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_expiry(raw: Option<String>) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SESSION_EXPIRY_SECONDS);
    };
    match raw.trim().parse::<i64>() {
        Ok(seconds) if seconds > 0 => Ok(seconds),
        Ok(_) => Err(ConfigError::InvalidEnvVar(
            "LOYALTY_SESSION_EXPIRY_SECONDS".to_string(),
            "must be positive".to_string(),
        )),
        Err(e) => Err(ConfigError::InvalidEnvVar(
            "LOYALTY_SESSION_EXPIRY_SECONDS".to_string(),
            e.to_string(),
        )),
    }
}

/// Parse a boolean flag (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`).
fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_BREAK_GLASS_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_BREAK_GLASS_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://localhost/loyalty"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            base_url: Url::parse(base_url).unwrap(),
            session_expiry_seconds: DEFAULT_SESSION_EXPIRY_SECONDS,
            break_glass: BreakGlassConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("changeme-break-glass", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST_VAR").is_err());
        assert!(validate_secret_length(&SecretString::from("k".repeat(32)), "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("K", "true").unwrap());
        assert!(parse_flag("K", " YES ").unwrap());
        assert!(parse_flag("K", "1").unwrap());
        assert!(!parse_flag("K", "off").unwrap());
        assert!(!parse_flag("K", "").unwrap());
        assert!(parse_flag("K", "maybe").is_err());
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry(None).unwrap(), 3600);
        assert_eq!(parse_expiry(Some("900".to_string())).unwrap(), 900);
        assert!(parse_expiry(Some("0".to_string())).is_err());
        assert!(parse_expiry(Some("soon".to_string())).is_err());
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("https://loyalty.example.com").is_ok());
        assert!(parse_base_url("ftp://loyalty.example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_login_url_and_security() {
        let plain = config("http://localhost:3000/");
        assert_eq!(plain.login_url(), "http://localhost:3000/login");
        assert!(!plain.is_secure());

        let secure = config("https://rewards.example.com");
        assert_eq!(secure.login_url(), "https://rewards.example.com/login");
        assert!(secure.is_secure());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_break_glass_debug_redacts_secret() {
        let config = BreakGlassConfig {
            enabled: true,
            secret: Some(SecretString::from("super_sensitive_override_value")),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_sensitive_override_value"));
    }
}
