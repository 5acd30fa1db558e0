//! JWT token generation and validation
//!
//! Access and refresh tokens are signed with distinct secrets, so a token of
//! one kind never verifies as the other. Keys are pre-computed once and
//! shared through `AppState`.

use crate::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Token verification and signing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token invalid")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Which secret a token is signed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub token_type: TokenKind,
    /// Unique per token, so two tokens issued in the same second differ
    pub jti: Uuid,
}

/// Pre-computed JWT keys for one secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Issues and verifies access and refresh tokens.
///
/// Issuing a refresh token does not persist it; the auth flow stores it on
/// the user row.
#[derive(Clone)]
pub struct TokenService {
    access: JwtKeys,
    refresh: JwtKeys,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    validation: Arc<Validation>,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is evaluated against the wall clock with no grace period
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            access: JwtKeys::new(&config.access_secret),
            refresh: JwtKeys::new(&config.refresh_secret),
            access_ttl_secs: config.access_token_expiry_secs,
            refresh_ttl_secs: config.refresh_token_expiry_secs,
            validation: Arc::new(validation),
        }
    }

    /// Issue a new access/refresh pair for a user
    pub fn issue_token_pair(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, TokenKind::Access)?,
            refresh_token: self.sign(user_id, TokenKind::Refresh)?,
            expires_in: self.access_ttl_secs,
        })
    }

    /// Verify an access token and return the user id
    #[inline]
    pub fn verify_access(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    /// Verify a refresh token and return the user id
    #[inline]
    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify(token, TokenKind::Refresh)
    }

    /// Refresh token lifetime in seconds
    #[inline]
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    fn keys(&self, kind: TokenKind) -> &JwtKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn ttl(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    fn sign(&self, user_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            exp: (now + Duration::seconds(self.ttl(kind))).timestamp(),
            iat: now.timestamp(),
            token_type: kind,
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )?;

        if data.claims.token_type != kind {
            return Err(TokenError::Invalid);
        }
        Ok(data.claims.user_id)
    }

    /// Sign arbitrary claims with the key for `kind`. Used by tests to forge
    /// expired tokens.
    #[cfg(test)]
    pub(crate) fn sign_claims(&self, claims: &Claims) -> String {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys(claims.token_type).encoding)
            .unwrap()
    }
}
