//! Request bodies for account creation and customer updates.
//!
//! These are raw client input; `AuthService` validates them into
//! [`NewIdentity`](super::NewIdentity) and [`CustomerUpdate`](super::CustomerUpdate).

use secrecy::SecretString;
use serde::Deserialize;

/// Body of `POST /api/customers/signup`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerSignup {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub birthday: String,
    pub password: SecretString,
    /// Optional; when sent it must equal `email`.
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of the manager and executive creation routes.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaffSignup {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: SecretString,
    /// Break-glass secret; consumed by the authorization guard, never by the handler.
    #[serde(default, rename = "devSecret")]
    pub dev_secret: Option<SecretString>,
}

/// Whitelisted fields a customer update may touch.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub birthday: Option<String>,
    pub password: Option<SecretString>,
    pub preferences: Option<Vec<String>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_reject_unknown_fields() {
        let ok = serde_json::from_str::<CustomerChanges>(r#"{"name":"Ada","preferences":["tea"]}"#);
        assert!(ok.is_ok());

        for field in ["credits", "active", "type", "username", "verifyToken"] {
            let body = format!(r#"{{"{field}": 1}}"#);
            assert!(
                serde_json::from_str::<CustomerChanges>(&body).is_err(),
                "{field} must not be updatable"
            );
        }
    }

    #[test]
    fn test_staff_signup_accepts_dev_secret() {
        let body = r#"{"name":"Root","email":"root@example.com","password":"S3cure!pass","devSecret":"x"}"#;
        let signup: StaffSignup = serde_json::from_str(body).unwrap();
        assert!(signup.dev_secret.is_some());
        assert!(signup.phone.is_none());
    }

    #[test]
    fn test_customer_signup_debug_hides_password() {
        let body = r#"{"name":"Ada","phone":"9095550134","email":"ada@example.com","address":"1 Main St","birthday":"1990-01-01","password":"Sup3rSecretPw"}"#;
        let signup: CustomerSignup = serde_json::from_str(body).unwrap();
        assert!(!format!("{signup:?}").contains("Sup3rSecretPw"));
    }
}
