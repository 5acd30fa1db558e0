//! Authentication extractors
//!
//! [`CurrentUser`] validates the access token and loads the account on every
//! request. Role-gated wrappers ([`ModeratorUser`], [`AdminUser`]) build on
//! it and reject with 403.

use super::cookie::ACCESS_COOKIE;
use super::jwt::TokenError;
use crate::error::{ApiError, ApiResult};
use crate::repositories::UserRecord;
use crate::state::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use blog_shared::{AuthErrorCode, Role};
use uuid::Uuid;

/// Authenticated account attached to a request. Carries no secrets.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<&UserRecord> for CurrentUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

impl CurrentUser {
    /// Fail with 403 unless the role is one of `allowed`
    pub fn require_role(&self, allowed: &[Role]) -> ApiResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Access denied. Insufficient permissions."))
        }
    }

    /// Fail with 403 unless the role is at least `min`
    pub fn require_at_least(&self, min: Role) -> ApiResult<()> {
        let allowed: Vec<Role> = Role::ALL.into_iter().filter(|r| *r >= min).collect();
        self.require_role(&allowed)
    }
}

/// Locate the access token: `Authorization: Bearer` first, then the
/// `accessToken` cookie.
pub fn access_token_from(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ACCESS_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = access_token_from(&parts.headers)
            .ok_or(ApiError::Unauthorized(AuthErrorCode::TokenMissing))?;

        let user_id = app_state.jwt().verify_access(&token).map_err(|e| {
            ApiError::Unauthorized(match e {
                TokenError::Expired => AuthErrorCode::TokenExpired,
                _ => AuthErrorCode::TokenInvalid,
            })
        })?;

        let user = app_state
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::Unauthorized(AuthErrorCode::UserNotFound))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized(AuthErrorCode::UserInactive));
        }

        Ok(CurrentUser::from(&user))
    }
}

/// Authenticated MODERATOR or above
#[derive(Debug, Clone)]
pub struct ModeratorUser(pub CurrentUser);

/// Authenticated ADMIN or SUPERADMIN
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ModeratorUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        user.require_at_least(Role::Moderator)?;
        Ok(ModeratorUser(user))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        user.require_role(&Role::STAFF)?;
        Ok(AdminUser(user))
    }
}
