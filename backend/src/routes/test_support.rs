//! Router test helpers over the in-memory store

use crate::config::AppConfig;
use crate::routes::create_router;
use crate::state::AppState;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "P@ssw0rd1";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.bcrypt_cost = 10;
    config
}

pub fn test_app() -> (AppState, Router) {
    let state = AppState::in_memory(test_config());
    let app = create_router(state.clone());
    (state, app)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Value of the `refreshToken` cookie set by this response, if any
    pub fn refresh_cookie(&self) -> Option<String> {
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with("refreshToken="))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.refresh_cookie().and_then(|c| {
            c.trim_start_matches("refreshToken=")
                .split(';')
                .next()
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        })
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }

    pub fn access_token(&self) -> String {
        self.body["data"]["accessToken"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// Request builder with optional bearer token and cookie
pub struct Call<'a> {
    method: Method,
    uri: &'a str,
    bearer: Option<&'a str>,
    cookie: Option<String>,
    body: Option<Value>,
}

pub fn call(method: Method, uri: &str) -> Call<'_> {
    Call {
        method,
        uri,
        bearer: None,
        cookie: None,
        body: None,
    }
}

impl<'a> Call<'a> {
    pub fn bearer(mut self, token: &'a str) -> Self {
        self.bearer = Some(token);
        self
    }

    pub fn refresh_cookie(mut self, token: &str) -> Self {
        self.cookie = Some(format!("refreshToken={}", token));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub async fn send(self, app: &Router) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(cookie) = self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub fn registration(username: &str) -> Value {
    json!({
        "firstName": "Ann",
        "lastName": "Lee",
        "email": format!("{}@x.com", username),
        "username": username,
        "password": PASSWORD,
    })
}

/// Register `username` and return the registration response
pub async fn register(app: &Router, username: &str) -> TestResponse {
    let response = call(Method::POST, "/api/v1/auth/register")
        .json(registration(username))
        .send(app)
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response
}
