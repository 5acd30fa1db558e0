//! Integration tests for posts and topics

mod common;

use axum::http::{Method, StatusCode};
use blog_shared::Role;
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::{json, Value};

async fn topic(app: &TestApp, token: &str, body: Value) -> Value {
    let response = app.post("/api/v1/topics", Some(token), body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.data().clone()
}

async fn post(app: &TestApp, token: &str, body: Value) -> Value {
    let response = app.post("/api/v1/posts", Some(token), body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.data().clone()
}

async fn publishing_flow(app: &TestApp) {
    let (moderator, _) = app.user("editor", Role::Moderator).await;
    let rust = topic(app, &moderator, json!({ "name": "Rust", "slug": "Rust" })).await;
    assert_eq!(rust["slug"], "rust");

    let created = post(
        app,
        &moderator,
        json!({
            "title": "Ownership explained",
            "content": "Borrowing rules in depth",
            "topicId": rust["id"],
            "tags": ["Rust", "memory"],
            "publishDate": (Utc::now() + Duration::days(1)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(created["status"], "SCHEDULED");
    assert_eq!(created["isScheduled"], true);

    // Not visible as published until due
    let listed = app.get("/api/v1/posts?status=PUBLISHED&topic=rust", None).await;
    assert_eq!(listed.data()["total"], 0);

    let id = created["id"].as_str().unwrap();
    let published = app
        .request(
            Method::PATCH,
            &format!("/api/v1/posts/{}/publish", id),
            Some(&moderator),
            None,
        )
        .await;
    assert_eq!(published.status, StatusCode::OK);
    assert_eq!(published.data()["isScheduled"], false);

    let listed = app.get("/api/v1/posts?status=PUBLISHED&tag=RUST", None).await;
    assert_eq!(listed.data()["total"], 1);
    assert_eq!(listed.data()["items"][0]["topic"]["slug"], "rust");

    let slug = created["slug"].as_str().unwrap();
    let detail = app.get(&format!("/api/v1/posts/{}", slug), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.data()["readCount"], 1);
    assert!(detail.data()["navigation"]["prevPost"].is_null());

    // Unpublishing leaves an undated, unscheduled SCHEDULED post
    let uri = format!("/api/v1/posts/{}", id);
    let unpublished = app
        .request(Method::PATCH, &format!("{}/unpublish", uri), Some(&moderator), None)
        .await;
    assert_eq!(unpublished.status, StatusCode::OK, "{}", unpublished.body);
    assert_eq!(unpublished.data()["status"], "SCHEDULED");
    assert!(unpublished.data()["publishDate"].is_null());
    assert_eq!(unpublished.data()["isScheduled"], false);

    let listed = app.get("/api/v1/posts?status=PUBLISHED&topic=rust", None).await;
    assert_eq!(listed.data()["total"], 0);

    // Asking a published post for SCHEDULED without a date does the same
    let republished = app
        .request(Method::PATCH, &format!("{}/publish", uri), Some(&moderator), None)
        .await;
    assert_eq!(republished.data()["status"], "PUBLISHED");
    let rescheduled = app
        .request(Method::PUT, &uri, Some(&moderator), Some(json!({ "status": "SCHEDULED" })))
        .await;
    assert_eq!(rescheduled.status, StatusCode::OK, "{}", rescheduled.body);
    assert_eq!(rescheduled.data()["status"], "SCHEDULED");
    assert!(rescheduled.data()["publishDate"].is_null());
    assert_eq!(rescheduled.data()["isScheduled"], false);

    let undated = post(
        app,
        &moderator,
        json!({ "title": "Coming soon", "content": "Lifetimes", "status": "SCHEDULED" }),
    )
    .await;
    assert_eq!(undated["status"], "SCHEDULED");
    assert!(undated["publishDate"].is_null());
    assert_eq!(undated["isScheduled"], false);
}

#[tokio::test]
async fn test_publishing_flow() {
    publishing_flow(&TestApp::new()).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_publishing_flow_postgres() {
    publishing_flow(&TestApp::postgres().await).await;
}

#[tokio::test]
async fn test_update_only_changes_present_fields() {
    let app = TestApp::new();
    let (token, _) = app.user("writer", Role::User).await;
    let created = post(
        &app,
        &token,
        json!({ "title": "Before", "content": "one two three", "excerpt": "short", "tags": ["a"] }),
    )
    .await;

    let updated = app
        .request(
            Method::PUT,
            &format!("/api/v1/posts/{}", created["id"].as_str().unwrap()),
            Some(&token),
            Some(json!({ "title": "After" })),
        )
        .await;

    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["title"], "After");
    assert_eq!(updated.data()["content"], "one two three");
    assert_eq!(updated.data()["excerpt"], "short");
    assert_eq!(updated.data()["tags"][0]["name"], "a");
    assert_eq!(updated.data()["slug"], created["slug"]);
}

#[tokio::test]
async fn test_delete_post_is_owner_only() {
    let app = TestApp::new();
    let (owner, _) = app.user("writer", Role::User).await;
    let (other, _) = app.user("reader", Role::User).await;
    let created = post(&app, &owner, json!({ "title": "Mine", "content": "text" })).await;
    let uri = format!("/api/v1/posts/{}", created["id"].as_str().unwrap());

    let denied = app.request(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app.request(Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let slug_uri = format!("/api/v1/posts/{}", created["slug"].as_str().unwrap());
    assert_eq!(app.get(&slug_uri, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_topic_cycles_are_rejected() {
    let app = TestApp::new();
    let (moderator, _) = app.user("editor", Role::Moderator).await;
    let parent = topic(&app, &moderator, json!({ "name": "Languages", "slug": "languages" })).await;
    let child = topic(
        &app,
        &moderator,
        json!({ "name": "Rust", "slug": "rust", "parentId": parent["id"] }),
    )
    .await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/topics/{}", parent["id"].as_str().unwrap()),
            Some(&moderator),
            Some(json!({ "parentId": child["id"] })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let detail = app.get("/api/v1/topics/languages", None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.data()["children"][0]["slug"], "rust");
}

#[tokio::test]
async fn test_topic_delete_needs_admin() {
    let app = TestApp::new();
    let (moderator, _) = app.user("editor", Role::Moderator).await;
    let (admin, _) = app.user("admin1", Role::Admin).await;
    let created = topic(&app, &moderator, json!({ "name": "Misc", "slug": "misc" })).await;
    let uri = format!("/api/v1/topics/{}", created["id"].as_str().unwrap());

    let denied = app.request(Method::DELETE, &uri, Some(&moderator), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app.request(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
}

#[tokio::test]
async fn test_categories() {
    let app = TestApp::new();
    let (moderator, _) = app.user("editor", Role::Moderator).await;

    let created = app
        .post("/api/v1/categories", Some(&moderator), json!({ "name": "Release Notes" }))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.data()["slug"], "release-notes");

    let duplicate = app
        .post("/api/v1/categories", Some(&moderator), json!({ "name": "Release Notes" }))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let listed = app.get("/api/v1/categories", None).await;
    assert_eq!(listed.data().as_array().unwrap().len(), 1);
}
