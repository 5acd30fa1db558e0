//! Authentication routes
//!
//! The refresh token travels only in the HTTP-only `refreshToken` cookie
//! (with a body fallback on refresh). Access tokens are returned in the body
//! and sent back as `Authorization: Bearer`.

use crate::auth::{refresh_token_from, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::routes::payload::ApiJson;
use crate::services::{AuthService, Session};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use blog_shared::{
    ApiResponse, AuthPayload, FullProfile, LoginRequest, ProfilePayload, RefreshRequest,
    RegisterRequest,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

type AuthResponse = (CookieJar, Json<ApiResponse<AuthPayload>>);

fn payload(session: &Session) -> AuthPayload {
    AuthPayload {
        user: session.user.profile(),
        access_token: session.tokens.access_token.clone(),
        expires_in: session.tokens.expires_in,
    }
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieJar, Json<ApiResponse<AuthPayload>>)> {
    let session = AuthService::register(
        state.repos.users.as_ref(),
        state.jwt(),
        state.bcrypt_cost(),
        req,
    )
    .await?;

    let body = ApiResponse::ok("User registered successfully", payload(&session));
    let jar = state.cookies.set(jar, session.tokens.refresh_token);
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let session = AuthService::login(
        state.repos.users.as_ref(),
        state.jwt(),
        state.bcrypt_cost(),
        req,
    )
    .await?;

    let body = ApiResponse::ok("Login successful", payload(&session));
    let jar = state.cookies.set(jar, session.tokens.refresh_token);
    Ok((jar, Json(body)))
}

/// POST /api/v1/auth/refresh
///
/// Any 401 here also clears the cookie so the client stops presenting it.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<ApiJson<RefreshRequest>>,
) -> Result<AuthResponse, (CookieJar, ApiError)> {
    let presented = refresh_token_from(&jar)
        .or_else(|| body.and_then(|ApiJson(req)| req.refresh_token));

    match AuthService::refresh(state.repos.users.as_ref(), state.jwt(), presented).await {
        Ok(session) => {
            let body = ApiResponse::ok("Token refreshed successfully", payload(&session));
            let jar = state.cookies.set(jar, session.tokens.refresh_token);
            Ok((jar, Json(body)))
        }
        Err(err @ ApiError::Unauthorized(_)) => Err((state.cookies.clear(jar), err)),
        Err(err) => Err((jar, err)),
    }
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    AuthService::logout(state.repos.users.as_ref(), user.id).await;
    (
        state.cookies.clear(jar),
        Json(ApiResponse::message("Logged out successfully")),
    )
}

/// GET /api/v1/auth/profile
async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<ProfilePayload>>> {
    let record = AuthService::profile(state.repos.users.as_ref(), user.id).await?;
    let payload = ProfilePayload {
        user: FullProfile {
            full_name: record.full_name(),
            profile: record.profile(),
        },
    };
    Ok(Json(ApiResponse::ok("Profile retrieved successfully", payload)))
}
