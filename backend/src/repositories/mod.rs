//! Data access layer
//!
//! Each aggregate has a repository trait with a PostgreSQL implementation.
//! [`memory::InMemoryStore`] implements every trait over in-process maps with
//! the same uniqueness rules, and backs the test suite.

use async_trait::async_trait;
use blog_shared::{Role, UserStats};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub mod category;
pub mod memory;
pub mod post;
pub mod topic;
pub mod user;

pub use category::{CategoryRecord, PgCategoryRepository};
pub use memory::InMemoryStore;
pub use post::{NewPost, PgPostRepository, PostFilter, PostLinkRecord, PostRecord, TagRecord};
pub use topic::{NewTopic, PgTopicRepository, TopicRecord};
pub use user::{NewUser, PgUserRepository, ProfileChanges, UserListFilter, UserRecord, UserSortField};

/// Store-layer failures, mapped to HTTP at the handler boundary
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A unique constraint was violated
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Classify a sqlx error, turning unique violations into [`StoreError::Conflict`]
pub(crate) fn map_sqlx(err: sqlx::Error, conflict_message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(conflict_message.to_string())
        }
        sqlx::Error::RowNotFound => StoreError::NotFound("Record"),
        _ => StoreError::Database(err),
    }
}

// ============================================================================
// Repository traits
// ============================================================================

/// Credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Email and username (case-insensitive) are unique.
    async fn create(&self, new: NewUser) -> StoreResult<UserRecord>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Case-insensitive username lookup
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    /// Match an identifier against email or username, case-insensitively
    async fn find_by_login(&self, identifier: &str) -> StoreResult<Option<UserRecord>>;

    /// Overwrite the single refresh-token slot
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> StoreResult<()>;

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<UserRecord>;

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<UserRecord>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> StoreResult<UserRecord>;

    /// Delete a user and, by cascade, their posts
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Filtered page of users with their post counts, plus the total match count
    async fn list(&self, filter: &UserListFilter) -> StoreResult<(Vec<(UserRecord, i64)>, i64)>;

    async fn stats(&self) -> StoreResult<UserStats>;
}

/// Post store, including tags
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post. Slugs are unique.
    async fn create(&self, new: NewPost) -> StoreResult<PostRecord>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PostRecord>>;

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<PostRecord>>;

    /// Persist every mutable column of `post`
    async fn update(&self, post: &PostRecord) -> StoreResult<PostRecord>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Filtered page, newest first, plus the total match count
    async fn list(&self, filter: &PostFilter) -> StoreResult<(Vec<PostRecord>, i64)>;

    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<PostRecord>>;

    /// Author's SCHEDULED posts that carry a publish date, soonest first
    async fn list_scheduled_by_author(&self, author_id: Uuid) -> StoreResult<Vec<PostRecord>>;

    /// Published posts of a topic in navigation order
    async fn published_in_topic(&self, topic_id: Uuid) -> StoreResult<Vec<PostLinkRecord>>;

    /// Flip every due scheduled post to PUBLISHED in one statement
    async fn publish_due(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    async fn increment_read_count(&self, id: Uuid) -> StoreResult<()>;

    /// Replace the post's tag associations, creating missing tags
    async fn set_tags(&self, post_id: Uuid, names: &[String]) -> StoreResult<Vec<TagRecord>>;

    /// Tags of several posts, in association order
    async fn tags_for(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<TagRecord>>>;
}

/// Topic hierarchy store
#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn create(&self, new: NewTopic) -> StoreResult<TopicRecord>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TopicRecord>>;

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<TopicRecord>>;

    /// All topics ordered by `sort_order`, then name
    async fn list(&self) -> StoreResult<Vec<TopicRecord>>;

    async fn update(&self, topic: &TopicRecord) -> StoreResult<TopicRecord>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    async fn count_children(&self, id: Uuid) -> StoreResult<i64>;

    async fn count_posts(&self, id: Uuid) -> StoreResult<i64>;
}

/// Flat category store
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, name: &str, slug: &str) -> StoreResult<CategoryRecord>;

    /// All categories sorted by name
    async fn list(&self) -> StoreResult<Vec<CategoryRecord>>;
}
