//! Integration tests for the session lifecycle

mod common;

use axum::http::{Method, StatusCode};
use blog_shared::Role;
use common::{registration, TestApp, PASSWORD};
use serde_json::json;

async fn session_flow(app: &TestApp) {
    let registered = app
        .post("/api/v1/auth/register", None, registration("alice"))
        .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);
    assert_eq!(registered.body["message"], "User registered successfully");
    let first_refresh = registered.refresh_token().expect("refresh cookie");

    let login = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "username": "ALICE", "password": PASSWORD }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["message"], "Login successful");
    let second_refresh = login.refresh_token().expect("refresh cookie");
    assert_ne!(first_refresh, second_refresh);

    // Login replaced the stored token
    let stale = app.refresh_with_cookie(&first_refresh).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.body["code"], "REFRESH_TOKEN_MISMATCH");

    let refreshed = app.refresh_with_cookie(&second_refresh).await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let access = refreshed.access_token();

    let profile = app.get("/api/v1/auth/profile", Some(&access)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.data()["user"]["username"], "alice");

    let logout = app
        .request(Method::POST, "/api/v1/auth/logout", Some(&access), None)
        .await;
    assert_eq!(logout.status, StatusCode::OK);

    let after_logout = app
        .refresh_with_cookie(&refreshed.refresh_token().unwrap())
        .await;
    assert_eq!(after_logout.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_lifecycle() {
    session_flow(&TestApp::new()).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_session_lifecycle_postgres() {
    session_flow(&TestApp::postgres().await).await;
}

#[tokio::test]
async fn test_register_rejects_weak_password_and_bad_email() {
    let app = TestApp::new();
    let mut body = registration("bob");
    body["password"] = json!("weakpass");
    body["email"] = json!("not-an-email");

    let response = app.post("/api/v1/auth/register", None, body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["password"].is_string());
    assert!(response.body["errors"]["email"].is_string());
}

#[tokio::test]
async fn test_register_ignores_requested_role() {
    let app = TestApp::new();
    let mut body = registration("sneaky");
    body["role"] = json!("SUPERADMIN");

    let response = app.post("/api/v1/auth/register", None, body).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["user"]["role"], "USER");
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_deactivated_account_cannot_log_in() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin).await;
    let (_, target) = app.user("carol", Role::User).await;

    let toggled = app
        .request(
            Method::PATCH,
            &format!("/api/v1/user/{}/toggle-status", target),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(toggled.status, StatusCode::OK);

    let login = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "username": "carol", "password": PASSWORD }),
        )
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login.body["code"], "USER_INACTIVE");
}
