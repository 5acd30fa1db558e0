//! Machine-readable error codes for the Blog Platform API

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Authentication failure codes.
///
/// Every variant is reported with HTTP 401. Clients branch on the code:
/// `TokenExpired` means a silent refresh is worth attempting, anything else
/// means the user has to sign in again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthErrorCode {
    #[error("Access token not found")]
    TokenMissing,

    #[error("Access token expired")]
    TokenExpired,

    #[error("Invalid access token")]
    TokenInvalid,

    #[error("User not found")]
    UserNotFound,

    #[error("User account is deactivated")]
    UserInactive,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session expired. Please log in again.")]
    RefreshTokenMissing,

    #[error("Your session has expired. Please log in again.")]
    RefreshTokenInvalid,

    #[error("Invalid session. Please log in again for security.")]
    RefreshTokenMismatch,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::TokenMissing => "TOKEN_MISSING",
            AuthErrorCode::TokenExpired => "TOKEN_EXPIRED",
            AuthErrorCode::TokenInvalid => "TOKEN_INVALID",
            AuthErrorCode::UserNotFound => "USER_NOT_FOUND",
            AuthErrorCode::UserInactive => "USER_INACTIVE",
            AuthErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthErrorCode::RefreshTokenMissing => "REFRESH_TOKEN_MISSING",
            AuthErrorCode::RefreshTokenInvalid => "REFRESH_TOKEN_INVALID",
            AuthErrorCode::RefreshTokenMismatch => "REFRESH_TOKEN_MISMATCH",
        }
    }
}

/// Conflict codes returned with HTTP 409
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictCode {
    UserExists,
    UsernameExists,
    SlugExists,
    Conflict,
}

impl ConflictCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictCode::UserExists => "USER_EXISTS",
            ConflictCode::UsernameExists => "USERNAME_EXISTS",
            ConflictCode::SlugExists => "SLUG_EXISTS",
            ConflictCode::Conflict => "CONFLICT",
        }
    }
}

impl fmt::Display for ConflictCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_code_serializes_to_wire_name() {
        for code in [
            AuthErrorCode::TokenMissing,
            AuthErrorCode::TokenExpired,
            AuthErrorCode::RefreshTokenMismatch,
            AuthErrorCode::UserInactive,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_expired_and_invalid_are_distinct() {
        assert_ne!(AuthErrorCode::TokenExpired.as_str(), AuthErrorCode::TokenInvalid.as_str());
        assert_ne!(
            AuthErrorCode::TokenExpired.to_string(),
            AuthErrorCode::TokenInvalid.to_string()
        );
    }
}
