//! Route definitions for the Blog Platform API
//!
//! This module organizes all API routes and applies middleware.

use crate::config::CorsConfig;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

mod auth;
mod health;
pub mod payload;
mod posts;
mod topics;
mod users;

#[cfg(test)]
mod test_support;

pub use auth::auth_routes;
pub use posts::{me_routes, post_routes};
pub use topics::{category_routes, topic_routes};
pub use users::user_routes;

/// Largest accepted request body; leaves room for a preview image plus form fields
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", api_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "Blog Platform API v1" }))
        .nest("/auth", auth_routes())
        .nest("/user", user_routes())
        .nest("/me", me_routes())
        .nest("/posts", post_routes())
        .nest("/topics", topic_routes())
        .nest("/categories", category_routes())
}

/// Credentialed CORS for the configured origins; the refresh cookie needs it
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
