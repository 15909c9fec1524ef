//! In-process test harness for the loyalty API.
//!
//! Builds the real router over [`MemoryUserDirectory`] and a tower-sessions
//! [`MemoryStore`], then drives it with `tower::ServiceExt::oneshot`. No
//! database or network is needed.
//!
//! ```rust,ignore
//! let app = TestApp::new();
//! let manager = app.seed(UserVariant::Manager, "m@example.com", true).await;
//! let mut agent = app.agent();
//! agent.login(UserVariant::Manager, "m@example.com").await;
//! assert_eq!(agent.get("/api/customers/all").await.status, StatusCode::OK);
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use argon2::Params;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::NaiveDate;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::{
    MemoryStore, SessionStore,
    cookie::time::{Duration, OffsetDateTime},
    session::{Id, Record},
};
use url::Url;

use loyalty_api::config::{ApiConfig, BreakGlassConfig};
use loyalty_api::db::{MemoryUserDirectory, UserDirectory};
use loyalty_api::middleware::session::SESSION_COOKIE_NAME;
use loyalty_api::models::{Identity, NewIdentity, NewKind, NewUser, keys};
use loyalty_api::services::auth::CredentialVerifier;
use loyalty_api::{AppState, app};
use loyalty_core::{Birthday, ContactInfo, Email, UserId, UserVariant};

/// Break-glass secret configured for every test app.
pub const DEV_SECRET: &str = "Zq8#vN2!pL5@wR9$kT4%mB7^cX1&hF6*";

/// Password of every seeded account.
pub const PASSWORD: &str = "Str0ng!Passw0rd";

/// Where verification redirects land.
pub const BASE_URL: &str = "http://localhost:3000";

fn cheap_verifier() -> CredentialVerifier {
    CredentialVerifier::with_params(Params::new(8, 1, 1, None).unwrap())
}

fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: Url::parse(BASE_URL).unwrap(),
        session_expiry_seconds: 3600,
        break_glass: BreakGlassConfig {
            enabled: true,
            secret: Some(SecretString::from(DEV_SECRET)),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A router plus direct handles on its stores.
pub struct TestApp {
    router: Router,
    pub directory: Arc<MemoryUserDirectory>,
    sessions: MemoryStore,
    verifier: CredentialVerifier,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let directory = Arc::new(MemoryUserDirectory::new());
        let sessions = MemoryStore::default();
        let state = AppState::new(test_config(), directory.clone(), cheap_verifier());
        Self {
            router: app(state, sessions.clone()),
            directory,
            sessions,
            verifier: cheap_verifier(),
        }
    }

    /// Insert an account with [`PASSWORD`] directly into the directory.
    ///
    /// Customers are created inactive and then activated when `active` is
    /// set; staff are always active.
    pub async fn seed(&self, variant: UserVariant, email: &str, active: bool) -> Identity {
        let token = UserId::generate().to_string();
        let kind = match variant {
            UserVariant::Customer => NewKind::Customer {
                address: "1 Main St".to_owned(),
                birthday: Birthday::from_stored(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
                verify_token: token.clone(),
            },
            UserVariant::Manager => NewKind::Manager,
            UserVariant::Executive => NewKind::Executive,
            UserVariant::Cashier => NewKind::Cashier,
        };
        let new = NewIdentity {
            user: NewUser {
                name: "Test User".to_owned(),
                username: email.to_owned(),
                contact: ContactInfo::new(Some(Email::parse(email).unwrap()), None).unwrap(),
                password_hash: self.verifier.hash(SecretString::from(PASSWORD)).await.unwrap(),
            },
            kind,
        };
        let identity = self.directory.insert(new).await.unwrap();

        if variant == UserVariant::Customer && active {
            self.directory.redeem_verify_token(&token).await.unwrap();
            return self
                .directory
                .find_by_id(variant, identity.id())
                .await
                .unwrap()
                .unwrap();
        }
        identity
    }

    /// An agent with no session.
    #[must_use]
    pub const fn agent(&self) -> Agent<'_> {
        Agent {
            app: self,
            cookie: None,
        }
    }

    /// An agent holding a session for `user_id`, made directly in the
    /// session store without going through login.
    pub async fn agent_with_session(&self, user_id: UserId) -> Agent<'_> {
        let mut record = Record {
            id: Id::default(),
            data: HashMap::from([(keys::USER_ID.to_owned(), json!(user_id))]),
            expiry_date: OffsetDateTime::now_utc() + Duration::hours(1),
        };
        self.sessions.create(&mut record).await.unwrap();
        Agent {
            app: self,
            cookie: Some(format!("{SESSION_COOKIE_NAME}={}", record.id)),
        }
    }
}

/// A response with its body decoded as JSON where possible.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Value::Null` for an empty or non-JSON body.
    pub json: Value,
    pub text: String,
}

/// A client with a one-cookie jar.
pub struct Agent<'a> {
    app: &'a TestApp,
    cookie: Option<String>,
}

impl Agent<'_> {
    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send_raw(method, uri, body.map(|body| body.to_string()))
            .await
    }

    /// Send `body` as-is with a JSON content type, whether or not it parses.
    pub async fn send_raw(&mut self, method: Method, uri: &str, body: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.router.clone().oneshot(request).await.unwrap();
        self.store_cookie(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        TestResponse {
            status,
            headers,
            json: serde_json::from_str(&text).unwrap_or(Value::Null),
            text,
        }
    }

    fn store_cookie(&mut self, headers: &HeaderMap) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let Some(pair) = value.split(';').next() else { continue };
            if let Some(session_id) = pair.strip_prefix(&prefix) {
                self.cookie = (!session_id.is_empty()).then(|| pair.to_owned());
            }
        }
    }

    #[must_use]
    pub const fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::DELETE, uri, Some(body)).await
    }

    /// Log in with [`PASSWORD`]; the session cookie is kept for later requests.
    pub async fn login(&mut self, variant: UserVariant, handle: &str) -> TestResponse {
        self.login_with(variant, handle, PASSWORD).await
    }

    pub async fn login_with(&mut self, variant: UserVariant, handle: &str, password: &str) -> TestResponse {
        let uri = format!("/api/user/login/{}", variant.as_str().to_lowercase());
        self.post(&uri, json!({ "username": handle, "password": password }))
            .await
    }
}
