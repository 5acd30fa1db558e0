//! Health check endpoints
//!
//! - /health - basic health check
//! - /health/ready - readiness probe, pings the database when one is attached
//! - /health/live - liveness probe

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn respond(status: &'static str, checks: Option<HealthChecks>) -> HealthResponse {
    HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks,
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(respond("healthy", None))
}

/// Returns 503 when the database does not answer
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = match &state.db {
        None => CheckStatus {
            status: "in-memory",
            message: None,
        },
        Some(pool) => match db::health_check(pool).await {
            Ok(()) => CheckStatus {
                status: "healthy",
                message: None,
            },
            Err(e) => CheckStatus {
                status: "unhealthy",
                message: Some(e.to_string()),
            },
        },
    };

    if database.status == "unhealthy" {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(respond("not_ready", Some(HealthChecks { database }))),
        ))
    } else {
        Ok(Json(respond("ready", Some(HealthChecks { database }))))
    }
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(respond("alive", None))
}
