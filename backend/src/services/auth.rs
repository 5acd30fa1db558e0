//! Authentication flows: register, login, refresh, logout
//!
//! Each account has a single refresh-token slot. Login and refresh overwrite
//! it (rotation), logout clears it, and refresh only succeeds when the
//! presented token equals the stored one.

use crate::auth::{PasswordService, TokenError, TokenPair, TokenService};
use crate::error::{ApiError, ApiResult};
use crate::repositories::{NewUser, StoreError, UserRecord, UserRepository};
use blog_shared::validation::{
    validate_email, validate_identifier, validate_name, validate_password, validate_username,
};
use blog_shared::{AuthErrorCode, ConflictCode, LoginRequest, RegisterRequest, Role};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of a successful register, login or refresh
#[derive(Debug)]
pub struct Session {
    pub user: UserRecord,
    pub tokens: TokenPair,
}

/// Authentication service
pub struct AuthService;

/// Collect `field -> "<Label> is required"` for every blank field
fn required<'a>(
    fields: &[(&str, &str, &'a Option<String>)],
    errors: &mut BTreeMap<String, String>,
) -> Vec<Option<&'a str>> {
    fields
        .iter()
        .map(|(key, label, value)| {
            let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty());
            if value.is_none() {
                errors.insert(key.to_string(), format!("{} is required", label));
            }
            value
        })
        .collect()
}

fn check(errors: &mut BTreeMap<String, String>, field: &str, result: Result<(), String>) {
    if let Err(message) = result {
        errors.entry(field.to_string()).or_insert(message);
    }
}

impl AuthService {
    /// Register a new account and open its first session
    pub async fn register(
        users: &dyn UserRepository,
        jwt: &TokenService,
        bcrypt_cost: u32,
        req: RegisterRequest,
    ) -> ApiResult<Session> {
        let mut errors = BTreeMap::new();
        let values = required(
            &[
                ("firstName", "First name", &req.first_name),
                ("lastName", "Last name", &req.last_name),
                ("email", "Email", &req.email),
                ("username", "Username", &req.username),
                ("password", "Password", &req.password),
            ],
            &mut errors,
        );
        let [Some(first_name), Some(last_name), Some(email), Some(username), Some(_)] =
            values[..]
        else {
            return Err(ApiError::Validation {
                message: "All fields are required".to_string(),
                errors,
            });
        };
        // Passwords are taken verbatim, surrounding whitespace included
        let password = req.password.clone().unwrap_or_default();

        check(&mut errors, "firstName", validate_name(first_name));
        check(&mut errors, "lastName", validate_name(last_name));
        check(&mut errors, "email", validate_email(email));
        check(&mut errors, "username", validate_username(username));
        check(&mut errors, "password", validate_password(&password));
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        let email = email.to_lowercase();

        if users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::conflict(
                ConflictCode::UserExists,
                "An account with this email already exists",
            ));
        }
        if users.find_by_username(username).await?.is_some() {
            return Err(ApiError::conflict(
                ConflictCode::UsernameExists,
                "This username is already taken",
            ));
        }

        let password_hash = PasswordService::hash_async(password, bcrypt_cost).await?;

        let user = users
            .create(NewUser {
                email,
                username: username.to_string(),
                password_hash,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ApiError::conflict(
                    ConflictCode::UserExists,
                    "An account with this email or username already exists",
                ),
                other => other.into(),
            })?;

        let session = Self::open_session(users, jwt, user).await?;
        info!(user_id = %session.user.id, "User registered");
        Ok(session)
    }

    /// Log in with an email or username. Unknown accounts and wrong
    /// passwords fail identically.
    pub async fn login(
        users: &dyn UserRepository,
        jwt: &TokenService,
        bcrypt_cost: u32,
        req: LoginRequest,
    ) -> ApiResult<Session> {
        let mut errors = BTreeMap::new();
        let values = required(
            &[
                ("username", "Email or Username", &req.username),
                ("password", "Password", &req.password),
            ],
            &mut errors,
        );
        let [Some(identifier), Some(_)] = values[..] else {
            return Err(ApiError::Validation {
                message: "Email/Username and password are required".to_string(),
                errors,
            });
        };
        if let Err(message) = validate_identifier(identifier) {
            return Err(ApiError::field("username", message));
        }
        let password = req.password.clone().unwrap_or_default();

        let Some(user) = users.find_by_login(identifier).await? else {
            PasswordService::verify_dummy(password, bcrypt_cost).await;
            debug!("Login attempt for unknown account");
            return Err(ApiError::Unauthorized(AuthErrorCode::InvalidCredentials));
        };

        let valid = PasswordService::verify_async(password, user.password_hash.clone()).await?;
        if !valid {
            debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(ApiError::Unauthorized(AuthErrorCode::InvalidCredentials));
        }
        if !user.is_active {
            return Err(ApiError::Unauthorized(AuthErrorCode::UserInactive));
        }

        let session = Self::open_session(users, jwt, user).await?;
        info!(user_id = %session.user.id, "User logged in");
        Ok(session)
    }

    /// Exchange the stored refresh token for a new pair, rotating the slot
    pub async fn refresh(
        users: &dyn UserRepository,
        jwt: &TokenService,
        presented: Option<String>,
    ) -> ApiResult<Session> {
        let presented = presented
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized(AuthErrorCode::RefreshTokenMissing))?;

        let user_id = jwt.verify_refresh(&presented).map_err(|e| {
            if let TokenError::Expired = e {
                debug!("Expired refresh token presented");
            }
            ApiError::Unauthorized(AuthErrorCode::RefreshTokenInvalid)
        })?;

        let user = users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::Unauthorized(AuthErrorCode::UserNotFound))?;

        // A token that verifies but is not the stored one was rotated out
        if user.refresh_token.as_deref() != Some(presented.as_str()) {
            warn!(user_id = %user.id, "Refresh token mismatch");
            return Err(ApiError::Unauthorized(AuthErrorCode::RefreshTokenMismatch));
        }
        if !user.is_active {
            return Err(ApiError::Unauthorized(AuthErrorCode::UserInactive));
        }

        Self::open_session(users, jwt, user).await
    }

    /// Clear the stored refresh token. Never fails: a store error is logged
    /// and the caller still clears the cookie.
    pub async fn logout(users: &dyn UserRepository, user_id: Uuid) {
        match users.set_refresh_token(user_id, None).await {
            Ok(()) => info!(user_id = %user_id, "User logged out"),
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to clear refresh token on logout"),
        }
    }

    /// Load the caller's account
    pub async fn profile(users: &dyn UserRepository, user_id: Uuid) -> ApiResult<UserRecord> {
        users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User profile not found"))
    }

    /// Issue a pair and persist its refresh token as the only live one
    async fn open_session(
        users: &dyn UserRepository,
        jwt: &TokenService,
        mut user: UserRecord,
    ) -> ApiResult<Session> {
        let tokens = jwt
            .issue_token_pair(user.id)
            .map_err(|e| ApiError::Internal(e.into()))?;
        users
            .set_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;
        user.refresh_token = Some(tokens.refresh_token.clone());
        Ok(Session { user, tokens })
    }
}
