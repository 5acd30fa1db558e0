//! Post routes
//!
//! `/:post` is a slug for reads and an id for writes.

use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiResult;
use crate::routes::payload::{ApiJson, ApiPath, ApiQuery, PostPayload};
use crate::services::PostService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use blog_shared::{
    ApiResponse, AutoPublishResponse, PostDetailResponse, PostListQuery, PostPage, PostResponse,
    ScheduleRequest,
};
use chrono::Utc;
use uuid::Uuid;

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/scheduled", get(scheduled_posts))
        .route("/auto-publish", post(auto_publish))
        .route("/:post", get(get_post).put(update_post).delete(delete_post))
        .route("/:post/publish", patch(publish_post))
        .route("/:post/unpublish", patch(unpublish_post))
        .route("/:post/schedule", patch(schedule_post))
        .route("/:post/duplicate", post(duplicate_post))
}

/// Routes scoped to the caller
pub fn me_routes() -> Router<AppState> {
    Router::new().route("/posts", get(my_posts))
}

type PostResult = ApiResult<Json<ApiResponse<PostResponse>>>;

/// POST /api/v1/posts
async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: PostPayload,
) -> ApiResult<(StatusCode, Json<ApiResponse<PostResponse>>)> {
    let post = PostService::create(
        &state.repos,
        state.images.as_ref(),
        &user,
        payload.request,
        payload.image,
        Utc::now(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Post created successfully", post)),
    ))
}

/// GET /api/v1/posts
async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> ApiResult<Json<ApiResponse<PostPage>>> {
    let page = PostService::list(&state.repos, query, Utc::now()).await?;
    Ok(Json(ApiResponse::ok("Posts retrieved successfully", page)))
}

/// GET /api/v1/posts/:slug
async fn get_post(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<Json<ApiResponse<PostDetailResponse>>> {
    let post = PostService::detail(&state.repos, &slug, Utc::now()).await?;
    Ok(Json(ApiResponse::ok("Post retrieved successfully", post)))
}

/// PUT /api/v1/posts/:id
async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    payload: PostPayload,
) -> PostResult {
    let post = PostService::update(
        &state.repos,
        state.images.as_ref(),
        &user,
        id,
        payload.request,
        payload.image,
        Utc::now(),
    )
    .await?;
    Ok(Json(ApiResponse::ok("Post updated successfully", post)))
}

/// DELETE /api/v1/posts/:id
async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    PostService::delete(&state.repos, &user, id).await?;
    Ok(Json(ApiResponse::message("Post deleted successfully")))
}

async fn publish_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> PostResult {
    let post = PostService::publish(&state.repos, &user, id, Utc::now()).await?;
    Ok(Json(ApiResponse::ok("Post published successfully", post)))
}

async fn unpublish_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> PostResult {
    let post = PostService::unpublish(&state.repos, &user, id).await?;
    Ok(Json(ApiResponse::ok("Post unpublished successfully", post)))
}

async fn schedule_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> PostResult {
    let post = PostService::schedule(&state.repos, &user, id, req, Utc::now()).await?;
    Ok(Json(ApiResponse::ok("Post scheduled successfully", post)))
}

async fn duplicate_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PostResponse>>)> {
    let post = PostService::duplicate(&state.repos, &user, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Post duplicated successfully", post)),
    ))
}

/// GET /api/v1/posts/scheduled
async fn scheduled_posts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<PostResponse>>>> {
    let posts = PostService::scheduled(&state.repos, &user, Utc::now()).await?;
    Ok(Json(ApiResponse::ok("Scheduled posts retrieved successfully", posts)))
}

/// POST /api/v1/posts/auto-publish
async fn auto_publish(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<Json<ApiResponse<AutoPublishResponse>>> {
    let published = PostService::auto_publish(&state.repos, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} scheduled post(s) published", published),
        AutoPublishResponse { published },
    )))
}

/// GET /api/v1/me/posts
async fn my_posts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<PostResponse>>>> {
    let posts = PostService::mine(&state.repos, &user, Utc::now()).await?;
    Ok(Json(ApiResponse::ok("Posts retrieved successfully", posts)))
}
