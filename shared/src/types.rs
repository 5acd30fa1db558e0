//! API request and response types
//!
//! All bodies use camelCase JSON. Request fields are optional at the type
//! level so that missing fields can be reported as field-level validation
//! errors instead of opaque deserialization failures.

use crate::models::{ContentType, PostStatus, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Envelopes
// ============================================================================

/// Success envelope: `{success: true, message, data?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Error envelope: `{success: false, message, code?, errors?, detail?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Field-level validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    /// Internal error text, only populated outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ============================================================================
// Authentication
// ============================================================================

/// Registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login request; `username` holds either an email or a username
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[serde(alias = "identifier", alias = "email")]
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Refresh request body (the cookie takes precedence)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Sanitized user record: never carries the password hash or refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Register / login / refresh payload. The refresh token travels only in
/// the HTTP-only cookie, never in this body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: UserProfile,
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Profile with the derived display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProfile {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub full_name: String,
}

/// `GET /auth/profile` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub user: FullProfile,
}

// ============================================================================
// User management
// ============================================================================

/// Editable profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
}

/// Role change request; kept as text so unknown roles yield a 400
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
}

/// User listing query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// `active` or `inactive`
    pub status: Option<String>,
    pub role: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// User row in the admin listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserProfile,
    pub post_count: i64,
}

/// Page-number pagination info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: i64,
    pub has_next: bool,
    pub has_prev: bool,
    pub limit: u32,
}

/// Account counts by status and role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub users: i64,
    pub moderators: i64,
    pub admins: i64,
    pub super_admins: i64,
}

/// `GET /user` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub items: Vec<UserListItem>,
    pub pagination: PaginationInfo,
    pub stats: UserStats,
}

/// `PATCH /user/:id/role` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeResponse {
    pub user: UserProfile,
    pub previous_role: Role,
    pub new_role: Role,
    pub updated_by: Uuid,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Posts
// ============================================================================

/// Post create/update request.
///
/// On create, `title` and `content` are required. On update every field is
/// optional and only present fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub html_content: Option<String>,
    pub content_type: Option<ContentType>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub publish_date: Option<DateTime<Utc>>,
    pub topic_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub order: Option<i32>,
}

/// `PATCH /posts/:id/schedule` request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleRequest {
    #[serde(alias = "date")]
    pub publish_date: Option<DateTime<Utc>>,
}

/// Post listing query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostListQuery {
    pub status: Option<PostStatus>,
    /// Topic slug
    pub topic: Option<String>,
    /// Tag name
    pub tag: Option<String>,
    /// Author id
    pub author: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Public author summary embedded in posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Topic summary embedded in posts and topics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Tag attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
}

/// Post as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub html_content: Option<String>,
    pub content_type: ContentType,
    pub excerpt: Option<String>,
    pub status: PostStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_scheduled: bool,
    pub preview_image_url: Option<String>,
    pub order: i32,
    pub read_count: i64,
    /// Estimated reading time in minutes
    pub read_time: i32,
    pub author_id: Uuid,
    pub author: Option<AuthorSummary>,
    pub topic: Option<TopicSummary>,
    pub tags: Vec<TagResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Link to a neighbouring post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostLink {
    pub slug: String,
    pub title: String,
}

/// Previous/next navigation within a topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostNavigation {
    pub prev_post: Option<PostLink>,
    pub next_post: Option<PostLink>,
}

/// `GET /posts/:slug` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub navigation: PostNavigation,
}

/// Offset-paginated post listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub items: Vec<PostResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

/// `POST /posts/auto-publish` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPublishResponse {
    pub published: u64,
}

// ============================================================================
// Topics and categories
// ============================================================================

/// Topic create/update request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub order: Option<i32>,
}

/// Topic as returned by the flat listing and detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<TopicSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /topics/:slug` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicDetailResponse {
    #[serde(flatten)]
    pub topic: TopicResponse,
    pub children: Vec<TopicResponse>,
}

/// Node of the topic hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub order: i32,
    pub parent_id: Option<Uuid>,
    pub children: Vec<TopicNode>,
}

/// Category create request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Category as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}
