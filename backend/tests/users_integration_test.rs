//! Integration tests for account administration

mod common;

use axum::http::{Method, StatusCode};
use blog_shared::Role;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_admin_listing_with_stats() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin).await;
    app.user("reader1", Role::User).await;
    app.user("reader2", Role::User).await;

    let response = app.get("/api/v1/user?limit=2&sortBy=username&sortOrder=asc", Some(&admin)).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["items"].as_array().unwrap().len(), 2);
    assert_eq!(data["items"][0]["username"], "admin1");
    assert_eq!(data["pagination"]["totalCount"], 3);
    assert_eq!(data["pagination"]["totalPages"], 2);
    assert_eq!(data["pagination"]["hasNext"], true);
    assert_eq!(data["stats"]["total"], 3);
    assert_eq!(data["stats"]["admins"], 1);
    assert!(data["items"][0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_listing_requires_staff() {
    let app = TestApp::new();
    let (moderator, _) = app.user("mod1", Role::Moderator).await;

    let response = app.get("/api/v1/user", Some(&moderator)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_users_see_only_themselves() {
    let app = TestApp::new();
    let (alice, alice_id) = app.user("alice", Role::User).await;
    let (_, bob_id) = app.user("bobby", Role::User).await;

    let own = app.get(&format!("/api/v1/user/{}", alice_id), Some(&alice)).await;
    assert_eq!(own.status, StatusCode::OK);

    let other = app.get(&format!("/api/v1/user/{}", bob_id), Some(&alice)).await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_update_trims_and_validates() {
    let app = TestApp::new();
    let (token, _) = app.user("alice", Role::User).await;

    let updated = app
        .request(
            Method::PUT,
            "/api/v1/user/profile",
            Some(&token),
            Some(json!({ "firstName": "  Alicia ", "bio": "Writes things" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["firstName"], "Alicia");
    assert_eq!(updated.data()["bio"], "Writes things");

    let invalid = app
        .request(
            Method::PUT,
            "/api/v1/user/profile",
            Some(&token),
            Some(json!({ "website": "not a url" })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.body["errors"]["website"].is_string());

    let profile = app.get("/api/v1/user/profile", Some(&token)).await;
    assert_eq!(profile.data()["fullName"], "Alicia User");
}

#[tokio::test]
async fn test_role_change_rules() {
    let app = TestApp::new();
    let (admin, admin_id) = app.user("admin1", Role::Admin).await;
    let (superadmin, _) = app.user("root1", Role::SuperAdmin).await;
    let (_, target) = app.user("target", Role::User).await;
    let uri = format!("/api/v1/user/{}/role", target);

    let promoted = app
        .request(Method::PATCH, &uri, Some(&admin), Some(json!({ "role": "MODERATOR" })))
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.data()["previousRole"], "USER");
    assert_eq!(promoted.data()["newRole"], "MODERATOR");
    assert_eq!(promoted.data()["updatedBy"], admin_id.to_string());

    let too_high = app
        .request(Method::PATCH, &uri, Some(&admin), Some(json!({ "role": "SUPERADMIN" })))
        .await;
    assert_eq!(too_high.status, StatusCode::FORBIDDEN);

    let unknown = app
        .request(Method::PATCH, &uri, Some(&superadmin), Some(json!({ "role": "OWNER" })))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let own = app
        .request(
            Method::PATCH,
            &format!("/api/v1/user/{}/role", admin_id),
            Some(&admin),
            Some(json!({ "role": "USER" })),
        )
        .await;
    assert_eq!(own.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_delete_peer_but_superadmin_can() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin).await;
    let (superadmin, _) = app.user("root1", Role::SuperAdmin).await;
    let (_, peer) = app.user("admin2", Role::Admin).await;
    let uri = format!("/api/v1/user/{}", peer);

    let denied = app.request(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app.request(Method::DELETE, &uri, Some(&superadmin), None).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app.get(&uri, Some(&superadmin)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_listing_postgres() {
    let app = TestApp::postgres().await;
    let (admin, _) = app.user("admin1", Role::Admin).await;
    app.user("reader1", Role::User).await;

    let response = app.get("/api/v1/user?search=reader", Some(&admin)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["pagination"]["totalCount"], 1);
    assert_eq!(response.data()["items"][0]["postCount"], 0);
}
