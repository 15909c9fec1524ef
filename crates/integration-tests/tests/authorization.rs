//! Guard behavior over the full router: status precedence, ownership,
//! rank, and the break-glass override.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use loyalty_core::{UserId, UserVariant};
use loyalty_integration_tests::{DEV_SECRET, PASSWORD, TestApp};

fn staff_body(email: &str) -> serde_json::Value {
    json!({ "name": "New Staff", "email": email, "password": PASSWORD })
}

#[tokio::test]
async fn test_anonymous_gets_401_with_empty_body() {
    let app = TestApp::new();
    let mut anon = app.agent();

    for uri in ["/api/user/self", "/api/user/loggedin", "/api/customers/all", "/api/managers/all"] {
        let response = anon.get(uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(response.text.is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn test_authenticated_without_capability_gets_403() {
    let app = TestApp::new();
    app.seed(UserVariant::Customer, "c@example.com", true).await;
    let mut customer = app.agent();
    assert_eq!(customer.login(UserVariant::Customer, "c@example.com").await.status, StatusCode::OK);

    let response = customer.get("/api/customers/all").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.text.is_empty());
    assert_eq!(customer.get("/api/managers/all").await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_inactive_customer_with_session_gets_403_on_self() {
    let app = TestApp::new();
    let inactive = app.seed(UserVariant::Customer, "new@example.com", false).await;

    let mut agent = app.agent_with_session(inactive.id()).await;
    assert_eq!(agent.get("/api/user/self").await.status, StatusCode::FORBIDDEN);

    let mut anon = app.agent();
    assert_eq!(anon.get("/api/user/self").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_orphaned_session_is_a_server_error() {
    let app = TestApp::new();
    let mut agent = app.agent_with_session(UserId::generate()).await;

    let response = agent.get("/api/user/self").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_executive_satisfies_manager_routes() {
    let app = TestApp::new();
    app.seed(UserVariant::Executive, "exec@example.com", true).await;
    let customer = app.seed(UserVariant::Customer, "c@example.com", true).await;
    let mut exec = app.agent();
    exec.login(UserVariant::Executive, "exec@example.com").await;

    let response = exec.get("/api/customers/all").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json.as_array().unwrap().len(), 1);

    let response = exec.get(&format!("/api/customers/one/{}", customer.id())).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["_id"], json!(customer.id()));
}

#[tokio::test]
async fn test_manager_deletes_customer_by_filter() {
    let app = TestApp::new();
    app.seed(UserVariant::Manager, "m@example.com", true).await;
    let customer = app.seed(UserVariant::Customer, "c@example.com", true).await;
    let mut manager = app.agent();
    manager.login(UserVariant::Manager, "m@example.com").await;

    let body = json!({ "filter": { "_id": customer.id() } });
    let response = manager.delete("/api/customers/delete", body.clone()).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "success": "Deleted 1 customer(s)." }));

    let response = manager.delete("/api/customers/delete", body).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.json, json!({ "info": "No customer(s) deleted." }));

    // The manager's own session is untouched.
    assert_eq!(manager.get("/api/user/self").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_manager_or_self_denies_anonymous_with_401() {
    let app = TestApp::new();
    let customer = app.seed(UserVariant::Customer, "c@example.com", true).await;
    let mut anon = app.agent();

    let response = anon
        .patch(
            "/api/customers",
            json!({ "filter": { "_id": customer.id() }, "update": { "name": "X" } }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = anon
        .delete("/api/customers/delete", json!({ "filter": { "_id": customer.id() } }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oversized_body_still_gets_401_when_anonymous() {
    let app = TestApp::new();
    let customer = app.seed(UserVariant::Customer, "c@example.com", true).await;
    let mut anon = app.agent();
    let big = "x".repeat(70 * 1024);

    let response = anon
        .patch(
            "/api/customers",
            json!({ "filter": { "_id": customer.id() }, "update": { "name": big } }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.text.is_empty());

    let response = anon
        .post("/api/executives/create", json!({ "name": big, "devSecret": DEV_SECRET }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.text.is_empty());
}

#[tokio::test]
async fn test_oversized_body_from_manager_is_bad_request() {
    let app = TestApp::new();
    app.seed(UserVariant::Manager, "m@example.com", true).await;
    let customer = app.seed(UserVariant::Customer, "c@example.com", true).await;
    let mut manager = app.agent();
    manager.login(UserVariant::Manager, "m@example.com").await;

    let response = manager
        .patch(
            "/api/customers",
            json!({ "filter": { "_id": customer.id() }, "update": { "name": "x".repeat(70 * 1024) } }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_on_owner_route_is_bad_request() {
    let app = TestApp::new();
    app.seed(UserVariant::Customer, "c@example.com", true).await;
    let mut customer = app.agent();
    customer.login(UserVariant::Customer, "c@example.com").await;

    let response = customer
        .send_raw(Method::PATCH, "/api/customers", Some("{\"filter\": {".to_owned()))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.text.is_empty());

    let mut anon = app.agent();
    let response = anon
        .send_raw(Method::PATCH, "/api/customers", Some("{\"filter\": {".to_owned()))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_updates_only_themself() {
    let app = TestApp::new();
    let me = app.seed(UserVariant::Customer, "me@example.com", true).await;
    let other = app.seed(UserVariant::Customer, "other@example.com", true).await;
    let mut agent = app.agent();
    agent.login(UserVariant::Customer, "me@example.com").await;

    let response = agent
        .patch("/api/customers", json!({ "_id": me.id(), "update": { "name": "Renamed" } }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json, json!({ "success": "Updated 1 user(s)." }));
    assert_eq!(agent.get("/api/user/self").await.json["name"], "Renamed");

    let response = agent
        .patch("/api/customers", json!({ "_id": other.id(), "update": { "name": "Nope" } }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Two locations naming different owners.
    let response = agent
        .patch(
            "/api/customers",
            json!({ "_id": me.id(), "filter": { "_id": other.id() }, "update": { "name": "Nope" } }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_rejects_fields_outside_whitelist() {
    let app = TestApp::new();
    let me = app.seed(UserVariant::Customer, "me@example.com", true).await;
    let mut agent = app.agent();
    agent.login(UserVariant::Customer, "me@example.com").await;

    for update in [json!({ "credits": 1000 }), json!({ "active": true }), json!({})] {
        let response = agent
            .patch("/api/customers", json!({ "_id": me.id(), "update": update }))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{update}");
    }
}

#[tokio::test]
async fn test_dev_secret_alone_creates_executive() {
    let app = TestApp::new();
    let mut anon = app.agent();

    let mut body = staff_body("root@example.com");
    body["devSecret"] = json!(DEV_SECRET);
    let response = anon.post("/api/executives/create", body).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json, json!({ "success": "Executive created." }));

    assert_eq!(
        anon.login(UserVariant::Executive, "root@example.com").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_executive_or_dev_denials() {
    let app = TestApp::new();
    let mut anon = app.agent();

    let mut body = staff_body("root@example.com");
    body["devSecret"] = json!("wrong-secret");
    assert_eq!(anon.post("/api/executives/create", body).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        anon.post("/api/executives/create", staff_body("root@example.com")).await.status,
        StatusCode::UNAUTHORIZED
    );

    app.seed(UserVariant::Manager, "m@example.com", true).await;
    let mut manager = app.agent();
    manager.login(UserVariant::Manager, "m@example.com").await;
    assert_eq!(
        manager.post("/api/executives/create", staff_body("e2@example.com")).await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_executive_creates_staff() {
    let app = TestApp::new();
    app.seed(UserVariant::Executive, "exec@example.com", true).await;
    let mut exec = app.agent();
    exec.login(UserVariant::Executive, "exec@example.com").await;

    let response = exec.post("/api/managers/create", staff_body("m@example.com")).await;
    assert_eq!(response.status, StatusCode::CREATED);
    let response = exec.post("/api/managers/create", staff_body("m@example.com")).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json, json!({ "error": "Email already exists" }));

    let response = exec.get("/api/managers/all").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json[0]["username"], "m@example.com");
    assert!(response.json[0].get("passwordHash").is_none());
}
