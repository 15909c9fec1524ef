//! Customer signup and email verification over the full router.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::{Value, json};

use loyalty_api::db::UserDirectory;
use loyalty_core::UserVariant;
use loyalty_integration_tests::{BASE_URL, TestApp};

fn signup_body(email: &str, phone: &str) -> Value {
    json!({
        "name": "Ada Lovelace",
        "phone": phone,
        "email": email,
        "address": "12 St James's Square",
        "birthday": "Sat Apr 21 1990",
        "password": "Analytical1",
    })
}

async fn verify_token_for(app: &TestApp, email: &str) -> String {
    app.directory
        .list(UserVariant::Customer)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.profile().username == email)
        .and_then(|c| c.as_customer().and_then(|c| c.verify_token.clone()))
        .unwrap()
}

#[tokio::test]
async fn test_signup_verify_login() {
    let app = TestApp::new();
    let mut agent = app.agent();

    let response = agent
        .post("/api/customers/signup", signup_body("ada@example.com", "9095550134"))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json, json!({ "success": "Customer created." }));

    // Not verified yet.
    let login = agent.login_with(UserVariant::Customer, "ada@example.com", "Analytical1").await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    let token = verify_token_for(&app, "ada@example.com").await;
    let response = agent.get(&format!("/api/customers/verify/{token}")).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers.get(header::LOCATION).unwrap(),
        &format!("{BASE_URL}/login")
    );

    // Phone works as a login handle too.
    let login = agent.login_with(UserVariant::Customer, "9095550134", "Analytical1").await;
    assert_eq!(login.status, StatusCode::OK);

    let response = agent.get(&format!("/api/customers/verify/{token}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json, json!({ "error": "Customer not found" }));
}

#[tokio::test]
async fn test_signup_conflicts_and_validation() {
    let app = TestApp::new();
    let mut agent = app.agent();
    agent
        .post("/api/customers/signup", signup_body("ada@example.com", "9095550134"))
        .await;

    let response = agent
        .post("/api/customers/signup", signup_body("ada@example.com", "9095550100"))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json, json!({ "error": "Email already exists" }));

    let response = agent
        .post("/api/customers/signup", signup_body("new@example.com", "9095550134"))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json, json!({ "error": "Phone number already exists" }));

    let mut too_young = signup_body("kid@example.com", "9095550101");
    too_young["birthday"] = json!("2015-06-01");
    assert_eq!(
        agent.post("/api/customers/signup", too_young).await.status,
        StatusCode::BAD_REQUEST
    );

    let mut weak = signup_body("weak@example.com", "9095550102");
    weak["password"] = json!("password");
    assert_eq!(agent.post("/api/customers/signup", weak).await.status, StatusCode::BAD_REQUEST);

    let mut extra = signup_body("extra@example.com", "9095550103");
    extra["credits"] = json!(500);
    assert_eq!(agent.post("/api/customers/signup", extra).await.status, StatusCode::BAD_REQUEST);
}
