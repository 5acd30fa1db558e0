//! Topic and category routes

use crate::auth::{AdminUser, ModeratorUser};
use crate::error::ApiResult;
use crate::routes::payload::{ApiJson, ApiPath};
use crate::services::{CategoryService, TopicService};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use blog_shared::{
    ApiResponse, CategoryRequest, CategoryResponse, TopicDetailResponse, TopicNode, TopicRequest,
    TopicResponse,
};
use uuid::Uuid;

/// `/:topic` is a slug for reads and an id for writes
pub fn topic_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_topics).post(create_topic))
        .route("/tree", get(topic_tree))
        .route("/:topic", get(get_topic).put(update_topic).delete(delete_topic))
}

pub fn category_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories).post(create_category))
}

async fn list_topics(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<TopicResponse>>>> {
    let topics = TopicService::list(state.repos.topics.as_ref()).await?;
    Ok(Json(ApiResponse::ok("Topics retrieved successfully", topics)))
}

async fn topic_tree(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<TopicNode>>>> {
    let tree = TopicService::tree(state.repos.topics.as_ref()).await?;
    Ok(Json(ApiResponse::ok("Topic tree retrieved successfully", tree)))
}

async fn get_topic(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<Json<ApiResponse<TopicDetailResponse>>> {
    let topic = TopicService::detail(state.repos.topics.as_ref(), &slug).await?;
    Ok(Json(ApiResponse::ok("Topic retrieved successfully", topic)))
}

async fn create_topic(
    State(state): State<AppState>,
    ModeratorUser(_): ModeratorUser,
    ApiJson(req): ApiJson<TopicRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TopicResponse>>)> {
    let topic = TopicService::create(state.repos.topics.as_ref(), req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Topic created successfully", topic)),
    ))
}

async fn update_topic(
    State(state): State<AppState>,
    ModeratorUser(_): ModeratorUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<TopicRequest>,
) -> ApiResult<Json<ApiResponse<TopicResponse>>> {
    let topic = TopicService::update(state.repos.topics.as_ref(), id, req).await?;
    Ok(Json(ApiResponse::ok("Topic updated successfully", topic)))
}

async fn delete_topic(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    TopicService::delete(state.repos.topics.as_ref(), id).await?;
    Ok(Json(ApiResponse::message("Topic deleted successfully")))
}

async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<CategoryResponse>>>> {
    let categories = CategoryService::list(state.repos.categories.as_ref()).await?;
    Ok(Json(ApiResponse::ok("Categories retrieved successfully", categories)))
}

async fn create_category(
    State(state): State<AppState>,
    ModeratorUser(_): ModeratorUser,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CategoryResponse>>)> {
    let category = CategoryService::create(state.repos.categories.as_ref(), req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Category created successfully", category)),
    ))
}
