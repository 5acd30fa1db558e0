//! User routes: own profile and privileged account management

use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::routes::payload::{ApiJson, ApiPath, ApiQuery};
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use blog_shared::{
    ApiResponse, FullProfile, RoleChangeResponse, UpdateProfileRequest, UpdateRoleRequest,
    UserListQuery, UserListResponse, UserProfile,
};
use uuid::Uuid;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/profile", get(own_profile).put(update_own_profile))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/:id/role", patch(change_role))
        .route("/:id/toggle-status", patch(toggle_status))
}

/// GET /api/v1/user
async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> ApiResult<Json<ApiResponse<UserListResponse>>> {
    let list = UserService::list(state.repos.users.as_ref(), query).await?;
    Ok(Json(ApiResponse::ok("Users retrieved successfully", list)))
}

/// GET /api/v1/user/profile
async fn own_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<FullProfile>>> {
    let record = UserService::get(state.repos.users.as_ref(), &user, user.id).await?;
    Ok(Json(ApiResponse::ok(
        "Profile retrieved successfully",
        FullProfile {
            full_name: record.full_name(),
            profile: record.profile(),
        },
    )))
}

/// PUT /api/v1/user/profile
async fn update_own_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let record = UserService::update_own_profile(state.repos.users.as_ref(), &user, req).await?;
    Ok(Json(ApiResponse::ok("Profile updated successfully", record.profile())))
}

/// GET /api/v1/user/:id
async fn get_user(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let record = UserService::get(state.repos.users.as_ref(), &user, id).await?;
    Ok(Json(ApiResponse::ok("User retrieved successfully", record.profile())))
}

/// PATCH /api/v1/user/:id
async fn update_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let record = UserService::update_user(state.repos.users.as_ref(), &actor, id, req).await?;
    Ok(Json(ApiResponse::ok("User updated successfully", record.profile())))
}

/// DELETE /api/v1/user/:id
async fn delete_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    UserService::delete(state.repos.users.as_ref(), &actor, id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

/// PATCH /api/v1/user/:id/role
async fn change_role(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> ApiResult<Json<ApiResponse<RoleChangeResponse>>> {
    let change = UserService::change_role(state.repos.users.as_ref(), &actor, id, req).await?;
    let message = format!(
        "User role updated from {} to {}",
        change.previous_role, change.new_role
    );
    Ok(Json(ApiResponse::ok(message, change)))
}

/// PATCH /api/v1/user/:id/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let record = UserService::toggle_status(state.repos.users.as_ref(), &actor, id).await?;
    let message = if record.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    Ok(Json(ApiResponse::ok(message, record.profile())))
}
