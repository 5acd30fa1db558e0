//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to the `{success: false, ...}` error envelope.

use crate::config::AppConfig;
use crate::repositories::StoreError;
use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blog_shared::{AuthErrorCode, ConflictCode, ErrorBody};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, String>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(AuthErrorCode),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { code: ConflictCode, message: String },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Validation failure carrying a field-level message map
    pub fn validation(errors: BTreeMap<String, String>) -> Self {
        ApiError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    /// Validation failure for a single field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.into());
        Self::validation(errors)
    }

    pub fn conflict(code: ConflictCode, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Auth code carried by a 401, if any
    pub fn auth_code(&self) -> Option<AuthErrorCode> {
        match self {
            ApiError::Unauthorized(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            StoreError::Conflict(message) => ApiError::conflict(ConflictCode::Conflict, message),
            StoreError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (code, errors, detail) = match &self {
            ApiError::Validation { errors, .. } => {
                (Some("VALIDATION_ERROR"), Some(errors.clone()), None)
            }
            ApiError::BadRequest(_) => (Some("BAD_REQUEST"), None, None),
            ApiError::Unauthorized(code) => (Some(code.as_str()), None, None),
            ApiError::Forbidden(_) => (Some("FORBIDDEN"), None, None),
            ApiError::NotFound(_) => (Some("NOT_FOUND"), None, None),
            ApiError::Conflict { code, .. } => (Some(code.as_str()), None, None),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                let detail = (!AppConfig::is_production()).then(|| format!("{:#}", err));
                (Some("INTERNAL_ERROR"), None, detail)
            }
        };

        let message = match &self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            success: false,
            message,
            code: code.map(str::to_string),
            errors,
            detail,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
