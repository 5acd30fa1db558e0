//! Post management service
//!
//! CRUD, the owner-only publication transitions, duplication, listings and
//! the detail view. Every read path runs the auto-publish sweep first so due
//! scheduled posts are served as PUBLISHED.

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::repositories::{NewPost, PostFilter, PostRecord, StoreError, TagRecord};
use crate::services::publication::{self, Publication};
use crate::services::storage::{ImageStorage, ImageUpload};
use crate::state::Repositories;
use blog_shared::text::{calculate_read_time, generate_slug, slug_base};
use blog_shared::{
    AuthorSummary, ConflictCode, PostDetailResponse, PostLink, PostListQuery, PostNavigation,
    PostPage, PostRequest, PostResponse, PostStatus, ScheduleRequest, TagResponse, TopicSummary,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
const MAX_TITLE_LEN: usize = 200;

/// Post service
pub struct PostService;

impl PostService {
    /// Create a post owned by `author`
    pub async fn create(
        repos: &Repositories,
        images: &dyn ImageStorage,
        author: &CurrentUser,
        req: PostRequest,
        image: Option<ImageUpload>,
        now: DateTime<Utc>,
    ) -> ApiResult<PostResponse> {
        let mut errors = BTreeMap::new();
        let title = req.title.as_deref().map(str::trim).unwrap_or_default();
        let content = req.content.as_deref().unwrap_or_default();
        if title.is_empty() {
            errors.insert("title".to_string(), "Title is required".to_string());
        } else if title.chars().count() > MAX_TITLE_LEN {
            errors.insert("title".to_string(), "Title must be 200 characters or fewer".to_string());
        }
        if content.trim().is_empty() {
            errors.insert("content".to_string(), "Content is required".to_string());
        }
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        if let Some(topic_id) = req.topic_id {
            ensure_topic(repos, topic_id).await?;
        }

        let slug = match explicit_slug(req.slug.as_deref())? {
            Some(slug) => {
                if repos.posts.find_by_slug(&slug).await?.is_some() {
                    return Err(slug_taken());
                }
                slug
            }
            None => generate_slug(title),
        };

        let preview_image_url = upload_image(images, image).await?;
        let state = publication::resolve(req.status, req.publish_date, now);

        let post = repos
            .posts
            .create(NewPost {
                title: title.to_string(),
                slug,
                content: content.to_string(),
                html_content: req.html_content,
                content_type: req.content_type.unwrap_or_default(),
                excerpt: trimmed(req.excerpt),
                status: state.status,
                publish_date: state.publish_date,
                is_scheduled: state.is_scheduled,
                author_id: author.id,
                topic_id: req.topic_id,
                preview_image_url,
                sort_order: req.order.unwrap_or(0),
                read_time: calculate_read_time(content),
            })
            .await
            .map_err(slug_conflict)?;

        let tags = normalize_tags(req.tags.as_deref().unwrap_or_default());
        if !tags.is_empty() {
            repos.posts.set_tags(post.id, &tags).await?;
        }

        info!(post_id = %post.id, author_id = %author.id, status = %post.status, "Post created");
        Self::single(repos, post).await
    }

    /// Apply the present fields of `req` to an owned post
    pub async fn update(
        repos: &Repositories,
        images: &dyn ImageStorage,
        actor: &CurrentUser,
        id: Uuid,
        req: PostRequest,
        image: Option<ImageUpload>,
        now: DateTime<Utc>,
    ) -> ApiResult<PostResponse> {
        let mut post = Self::owned(repos, actor, id, "edit").await?;

        if let Some(title) = req.title.as_deref().map(str::trim) {
            if title.is_empty() {
                return Err(ApiError::field("title", "Title cannot be empty"));
            }
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(ApiError::field("title", "Title must be 200 characters or fewer"));
            }
            post.title = title.to_string();
        }
        if let Some(slug) = explicit_slug(req.slug.as_deref())? {
            if slug != post.slug {
                if let Some(other) = repos.posts.find_by_slug(&slug).await? {
                    if other.id != post.id {
                        return Err(slug_taken());
                    }
                }
                post.slug = slug;
            }
        }
        if let Some(content) = req.content {
            if content.trim().is_empty() {
                return Err(ApiError::field("content", "Content cannot be empty"));
            }
            post.read_time = calculate_read_time(&content);
            post.content = content;
        }
        if req.html_content.is_some() {
            post.html_content = req.html_content;
        }
        if let Some(content_type) = req.content_type {
            post.content_type = content_type;
        }
        if req.excerpt.is_some() {
            post.excerpt = trimmed(req.excerpt);
        }
        if let Some(topic_id) = req.topic_id {
            ensure_topic(repos, topic_id).await?;
            post.topic_id = Some(topic_id);
        }
        if let Some(order) = req.order {
            post.sort_order = order;
        }

        if req.status.is_some() || req.publish_date.is_some() {
            // Publishing keeps a stored past date and scheduling a stored future one.
            // Scheduling with no usable date leaves the post unscheduled, as unpublish does.
            let stored = post.publish_date;
            let date = match req.status {
                Some(PostStatus::Published) => req.publish_date.or(stored.filter(|d| *d <= now)),
                Some(PostStatus::Scheduled) => req.publish_date.or(stored.filter(|d| *d > now)),
                _ => req.publish_date.or(stored),
            };
            publication::resolve(req.status, date, now).apply(&mut post);
        }

        if let Some(url) = upload_image(images, image).await? {
            post.preview_image_url = Some(url);
        }

        let post = repos.posts.update(&post).await.map_err(slug_conflict)?;
        if let Some(tags) = req.tags {
            repos.posts.set_tags(post.id, &normalize_tags(&tags)).await?;
        }

        info!(post_id = %post.id, status = %post.status, "Post updated");
        Self::single(repos, post).await
    }

    /// Delete an owned post and its tag associations
    pub async fn delete(repos: &Repositories, actor: &CurrentUser, id: Uuid) -> ApiResult<()> {
        let post = Self::owned(repos, actor, id, "delete").await?;
        repos.posts.delete(post.id).await?;
        info!(post_id = %id, "Post deleted");
        Ok(())
    }

    pub async fn publish(
        repos: &Repositories,
        actor: &CurrentUser,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> ApiResult<PostResponse> {
        Self::transition(repos, actor, id, "publish", publication::publish(now)).await
    }

    pub async fn unpublish(
        repos: &Repositories,
        actor: &CurrentUser,
        id: Uuid,
    ) -> ApiResult<PostResponse> {
        Self::transition(repos, actor, id, "unpublish", publication::unpublish()).await
    }

    pub async fn schedule(
        repos: &Repositories,
        actor: &CurrentUser,
        id: Uuid,
        req: ScheduleRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<PostResponse> {
        let date = req
            .publish_date
            .ok_or_else(|| ApiError::field("publishDate", "Publish date is required"))?;
        let state = publication::schedule(date, now).map_err(|e| ApiError::field("publishDate", e))?;
        Self::transition(repos, actor, id, "schedule", state).await
    }

    /// Copy an owned post into a new DRAFT
    pub async fn duplicate(
        repos: &Repositories,
        actor: &CurrentUser,
        id: Uuid,
    ) -> ApiResult<PostResponse> {
        let original = Self::owned(repos, actor, id, "duplicate").await?;
        let title = format!("{} (Copy)", original.title);
        let draft = Publication::DRAFT;

        let copy = repos
            .posts
            .create(NewPost {
                slug: generate_slug(&title),
                title,
                content: original.content,
                html_content: original.html_content,
                content_type: original.content_type,
                excerpt: original.excerpt,
                status: draft.status,
                publish_date: draft.publish_date,
                is_scheduled: draft.is_scheduled,
                author_id: actor.id,
                topic_id: original.topic_id,
                preview_image_url: original.preview_image_url,
                sort_order: original.sort_order,
                read_time: original.read_time,
            })
            .await
            .map_err(slug_conflict)?;

        let names: Vec<String> = repos
            .posts
            .tags_for(&[original.id])
            .await?
            .remove(&original.id)
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.name)
            .collect();
        if !names.is_empty() {
            repos.posts.set_tags(copy.id, &names).await?;
        }

        info!(post_id = %copy.id, source_id = %original.id, "Post duplicated");
        Self::single(repos, copy).await
    }

    /// Filtered listing, newest first
    pub async fn list(
        repos: &Repositories,
        query: PostListQuery,
        now: DateTime<Utc>,
    ) -> ApiResult<PostPage> {
        publication::sweep(repos.posts.as_ref(), now).await?;

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = query.offset.unwrap_or(0).max(0);
        let empty = PostPage {
            items: Vec::new(),
            total: 0,
            limit,
            offset,
            has_more: false,
        };

        let topic_id = match query.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(slug) => match repos.topics.find_by_slug(slug).await? {
                Some(topic) => Some(topic.id),
                None => return Ok(empty),
            },
            None => None,
        };

        let filter = PostFilter {
            status: query.status,
            topic_id,
            tag: query
                .tag
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
            author_id: query.author,
            limit,
            offset,
        };
        let (posts, total) = repos.posts.list(&filter).await?;
        let items = Self::responses(repos, posts).await?;

        Ok(PostPage {
            has_more: offset + (items.len() as i64) < total,
            items,
            total,
            limit,
            offset,
        })
    }

    /// Single post by slug with prev/next navigation inside its topic.
    /// Counts as a read.
    pub async fn detail(
        repos: &Repositories,
        slug: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<PostDetailResponse> {
        publication::sweep(repos.posts.as_ref(), now).await?;

        let mut post = repos
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;

        repos.posts.increment_read_count(post.id).await?;
        post.read_count += 1;

        let mut navigation = PostNavigation::default();
        if let (Some(topic_id), PostStatus::Published) = (post.topic_id, post.status) {
            let links = repos.posts.published_in_topic(topic_id).await?;
            if let Some(idx) = links.iter().position(|l| l.id == post.id) {
                let link = |i: usize| {
                    links.get(i).map(|l| PostLink {
                        slug: l.slug.clone(),
                        title: l.title.clone(),
                    })
                };
                navigation.prev_post = idx.checked_sub(1).and_then(link);
                navigation.next_post = link(idx + 1);
            }
        }

        Ok(PostDetailResponse {
            post: Self::single(repos, post).await?,
            navigation,
        })
    }

    /// Caller's scheduled posts, soonest first
    pub async fn scheduled(
        repos: &Repositories,
        actor: &CurrentUser,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<PostResponse>> {
        publication::sweep(repos.posts.as_ref(), now).await?;
        let posts = repos.posts.list_scheduled_by_author(actor.id).await?;
        Self::responses(repos, posts).await
    }

    /// Every post authored by the caller
    pub async fn mine(
        repos: &Repositories,
        actor: &CurrentUser,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<PostResponse>> {
        publication::sweep(repos.posts.as_ref(), now).await?;
        let posts = repos.posts.list_by_author(actor.id).await?;
        Self::responses(repos, posts).await
    }

    /// Run the sweep on demand
    pub async fn auto_publish(repos: &Repositories, now: DateTime<Utc>) -> ApiResult<u64> {
        Ok(publication::sweep(repos.posts.as_ref(), now).await?)
    }

    async fn transition(
        repos: &Repositories,
        actor: &CurrentUser,
        id: Uuid,
        action: &str,
        state: Publication,
    ) -> ApiResult<PostResponse> {
        let mut post = Self::owned(repos, actor, id, action).await?;
        state.apply(&mut post);
        let post = repos.posts.update(&post).await?;
        info!(post_id = %post.id, status = %post.status, action, "Post publication changed");
        Self::single(repos, post).await
    }

    async fn owned(
        repos: &Repositories,
        actor: &CurrentUser,
        id: Uuid,
        action: &str,
    ) -> ApiResult<PostRecord> {
        let post = repos
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;
        if post.author_id != actor.id {
            return Err(ApiError::forbidden(format!(
                "You can only {} your own posts",
                action
            )));
        }
        Ok(post)
    }

    async fn single(repos: &Repositories, post: PostRecord) -> ApiResult<PostResponse> {
        let mut items = Self::responses(repos, vec![post]).await?;
        items
            .pop()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post response missing")))
    }

    /// Attach author, topic and tags to a batch of posts
    async fn responses(repos: &Repositories, posts: Vec<PostRecord>) -> ApiResult<Vec<PostResponse>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut tags = repos.posts.tags_for(&ids).await?;

        let author_ids: Vec<Uuid> = posts
            .iter()
            .map(|p| p.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let authors: HashMap<Uuid, AuthorSummary> = repos
            .users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    AuthorSummary {
                        id: u.id,
                        username: u.username,
                        first_name: u.first_name,
                        last_name: u.last_name,
                    },
                )
            })
            .collect();

        let mut topics: HashMap<Uuid, TopicSummary> = HashMap::new();
        for topic_id in posts.iter().filter_map(|p| p.topic_id) {
            if topics.contains_key(&topic_id) {
                continue;
            }
            if let Some(topic) = repos.topics.find_by_id(topic_id).await? {
                topics.insert(
                    topic_id,
                    TopicSummary {
                        id: topic.id,
                        name: topic.name,
                        slug: topic.slug,
                    },
                );
            }
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let post_tags = tags.remove(&post.id).unwrap_or_default();
                let author = authors.get(&post.author_id).cloned();
                let topic = post.topic_id.and_then(|t| topics.get(&t).cloned());
                to_response(post, post_tags, author, topic)
            })
            .collect())
    }
}

fn to_response(
    post: PostRecord,
    tags: Vec<TagRecord>,
    author: Option<AuthorSummary>,
    topic: Option<TopicSummary>,
) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        html_content: post.html_content,
        content_type: post.content_type,
        excerpt: post.excerpt,
        status: post.status,
        publish_date: post.publish_date,
        is_scheduled: post.is_scheduled,
        preview_image_url: post.preview_image_url,
        order: post.sort_order,
        read_count: post.read_count,
        read_time: post.read_time,
        author_id: post.author_id,
        author,
        topic,
        tags: tags
            .into_iter()
            .map(|t| TagResponse { id: t.id, name: t.name })
            .collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// Trim and lowercase tag names, dropping blanks and later duplicates
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Normalize a client-supplied slug. Blank means "not supplied".
fn explicit_slug(raw: Option<&str>) -> ApiResult<Option<String>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => {
            let slug = slug_base(raw);
            if slug.is_empty() {
                return Err(ApiError::field("slug", "Slug must contain letters or digits"));
            }
            Ok(Some(slug))
        }
    }
}

async fn ensure_topic(repos: &Repositories, topic_id: Uuid) -> ApiResult<()> {
    match repos.topics.find_by_id(topic_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::field("topicId", "Topic not found")),
    }
}

/// Upload an optional preview image. Bad files are rejected; storage
/// failures only cost the image.
async fn upload_image(
    images: &dyn ImageStorage,
    image: Option<ImageUpload>,
) -> ApiResult<Option<String>> {
    let Some(image) = image else {
        return Ok(None);
    };
    image
        .validate()
        .map_err(|e| ApiError::field("previewImage", e))?;

    match images.upload(image).await {
        Ok(url) => Ok(Some(url)),
        Err(e) => {
            warn!(error = %e, "Preview image upload failed; saving post without image");
            Ok(None)
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn slug_taken() -> ApiError {
    ApiError::conflict(ConflictCode::SlugExists, "A post with this slug already exists")
}

fn slug_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => slug_taken(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryStore, NewTopic, NewUser, TopicRepository, UserRepository};
    use crate::services::storage::DisabledImageStorage;
    use async_trait::async_trait;
    use blog_shared::Role;
    use chrono::Duration;

    struct FixedUrlStorage;

    #[async_trait]
    impl ImageStorage for FixedUrlStorage {
        async fn upload(&self, _image: ImageUpload) -> anyhow::Result<String> {
            Ok("https://img.example/preview.png".to_string())
        }
    }

    async fn setup() -> (InMemoryStore, Repositories, CurrentUser) {
        let store = InMemoryStore::new();
        let repos = Repositories::in_memory(store.clone());
        let user = UserRepository::create(
            &store,
            NewUser {
                email: "ann@x.com".to_string(),
                username: "annlee".to_string(),
                password_hash: "hash".to_string(),
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
                role: Role::User,
            },
        )
        .await
        .unwrap();
        (store, repos, CurrentUser::from(&user))
    }

    fn request(title: &str) -> PostRequest {
        PostRequest {
            title: Some(title.to_string()),
            content: Some("one two three".to_string()),
            ..Default::default()
        }
    }

    async fn create(repos: &Repositories, author: &CurrentUser, req: PostRequest) -> PostResponse {
        PostService::create(repos, &DisabledImageStorage, author, req, None, Utc::now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_defaults_to_draft() {
        let (_, repos, ann) = setup().await;
        let post = create(&repos, &ann, request("Hello World")).await;

        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.slug.starts_with("hello-world-"));
        assert_eq!(post.read_time, 1);
        assert_eq!(post.author.unwrap().username, "annlee");
    }

    #[tokio::test]
    async fn test_future_date_schedules_then_sweep_publishes() {
        let (_, repos, ann) = setup().await;
        let now = Utc::now();
        let req = PostRequest {
            publish_date: Some(now + Duration::hours(1)),
            ..request("Later")
        };
        let post = PostService::create(&repos, &DisabledImageStorage, &ann, req, None, now)
            .await
            .unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert!(post.is_scheduled);

        let page = PostService::list(&repos, PostListQuery::default(), now + Duration::hours(2))
            .await
            .unwrap();
        let listed = page.items.iter().find(|p| p.id == post.id).unwrap();
        assert_eq!(listed.status, PostStatus::Published);
        assert!(!listed.is_scheduled);
    }

    #[tokio::test]
    async fn test_create_requires_title_and_content() {
        let (_, repos, ann) = setup().await;
        let err = PostService::create(
            &repos,
            &DisabledImageStorage,
            &ann,
            PostRequest::default(),
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::Validation { errors, .. } => {
                assert!(errors.contains_key("title"));
                assert!(errors.contains_key("content"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_explicit_duplicate_slug_conflicts() {
        let (_, repos, ann) = setup().await;
        let req = PostRequest {
            slug: Some("my-post".to_string()),
            ..request("One")
        };
        create(&repos, &ann, req.clone()).await;

        let err = PostService::create(&repos, &DisabledImageStorage, &ann, req, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict { code: ConflictCode::SlugExists, .. }));
    }

    #[tokio::test]
    async fn test_image_upload_failure_keeps_post() {
        let (_, repos, ann) = setup().await;
        let image = ImageUpload {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };

        let post = PostService::create(
            &repos,
            &DisabledImageStorage,
            &ann,
            request("With image"),
            Some(image.clone()),
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(post.preview_image_url.is_none());

        let post = PostService::create(
            &repos,
            &FixedUrlStorage,
            &ann,
            request("With image"),
            Some(image),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(post.preview_image_url.as_deref(), Some("https://img.example/preview.png"));
    }

    #[tokio::test]
    async fn test_only_owner_can_publish() {
        let (store, repos, ann) = setup().await;
        let post = create(&repos, &ann, request("Mine")).await;
        let bob = UserRepository::create(
            &store,
            NewUser {
                email: "bob@x.com".to_string(),
                username: "bobby".to_string(),
                password_hash: "hash".to_string(),
                first_name: "Bob".to_string(),
                last_name: "Ray".to_string(),
                role: Role::Admin,
            },
        )
        .await
        .unwrap();

        let err = PostService::publish(&repos, &CurrentUser::from(&bob), post.id, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);

        let published = PostService::publish(&repos, &ann, post.id, Utc::now()).await.unwrap();
        assert_eq!(published.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_unpublish_and_schedule() {
        let (_, repos, ann) = setup().await;
        let now = Utc::now();
        let post = create(&repos, &ann, request("Cycle")).await;

        let post = PostService::unpublish(&repos, &ann, post.id).await.unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert!(post.publish_date.is_none());

        let past = ScheduleRequest { publish_date: Some(now - Duration::minutes(1)) };
        assert!(PostService::schedule(&repos, &ann, post.id, past, now).await.is_err());

        let future = ScheduleRequest { publish_date: Some(now + Duration::days(1)) };
        let post = PostService::schedule(&repos, &ann, post.id, future, now).await.unwrap();
        assert!(post.is_scheduled);
    }

    #[tokio::test]
    async fn test_duplicate_copies_tags_as_draft() {
        let (_, repos, ann) = setup().await;
        let req = PostRequest {
            status: Some(PostStatus::Published),
            tags: Some(vec!["Rust".to_string(), " web ".to_string(), "rust".to_string()]),
            ..request("Original")
        };
        let original = create(&repos, &ann, req).await;
        let names: Vec<_> = original.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["rust", "web"]);

        let copy = PostService::duplicate(&repos, &ann, original.id).await.unwrap();
        assert_eq!(copy.title, "Original (Copy)");
        assert_eq!(copy.status, PostStatus::Draft);
        assert!(copy.publish_date.is_none());
        assert_ne!(copy.slug, original.slug);
        assert_eq!(copy.tags.len(), 2);
    }

    #[tokio::test]
    async fn test_detail_counts_reads_and_navigates() {
        let (store, repos, ann) = setup().await;
        let topic = TopicRepository::create(
            &store,
            NewTopic {
                name: "Rust".to_string(),
                slug: "rust".to_string(),
                parent_id: None,
                sort_order: 0,
            },
        )
        .await
        .unwrap();

        let mut posts = Vec::new();
        for (i, title) in ["First", "Second", "Third"].iter().enumerate() {
            let req = PostRequest {
                status: Some(PostStatus::Published),
                topic_id: Some(topic.id),
                order: Some(i as i32),
                ..request(title)
            };
            posts.push(create(&repos, &ann, req).await);
        }

        let detail = PostService::detail(&repos, &posts[1].slug, Utc::now()).await.unwrap();
        assert_eq!(detail.post.read_count, 1);
        assert_eq!(detail.navigation.prev_post.unwrap().slug, posts[0].slug);
        assert_eq!(detail.navigation.next_post.unwrap().slug, posts[2].slug);

        let first = PostService::detail(&repos, &posts[0].slug, Utc::now()).await.unwrap();
        assert!(first.navigation.prev_post.is_none());
    }

    #[tokio::test]
    async fn test_list_with_unknown_topic_is_empty() {
        let (_, repos, ann) = setup().await;
        create(&repos, &ann, request("Anything")).await;

        let page = PostService::list(
            &repos,
            PostListQuery {
                topic: Some("missing".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_update_with_status_published_keeps_content() {
        let (_, repos, ann) = setup().await;
        let post = create(&repos, &ann, request("Draft first")).await;

        let req = PostRequest {
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        let updated = PostService::update(&repos, &DisabledImageStorage, &ann, post.id, req, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.status, PostStatus::Published);
        assert_eq!(updated.title, "Draft first");
        assert_eq!(updated.slug, post.slug);
    }

    #[tokio::test]
    async fn test_update_status_scheduled_without_date_unschedules_published_post() {
        let (_, repos, ann) = setup().await;
        let now = Utc::now();
        let post = create(&repos, &ann, request("Live")).await;
        PostService::publish(&repos, &ann, post.id, now - Duration::hours(1))
            .await
            .unwrap();

        let req = PostRequest {
            status: Some(PostStatus::Scheduled),
            ..Default::default()
        };
        let updated = PostService::update(&repos, &DisabledImageStorage, &ann, post.id, req, None, now)
            .await
            .unwrap();

        let unpublished = publication::unpublish();
        assert_eq!(updated.status, unpublished.status);
        assert_eq!(updated.publish_date, unpublished.publish_date);
        assert_eq!(updated.is_scheduled, unpublished.is_scheduled);
    }

    #[tokio::test]
    async fn test_update_status_scheduled_keeps_future_date() {
        let (_, repos, ann) = setup().await;
        let now = Utc::now();
        let later = now + Duration::days(2);
        let req = PostRequest {
            publish_date: Some(later),
            ..request("Queued")
        };
        let post = PostService::create(&repos, &DisabledImageStorage, &ann, req, None, now)
            .await
            .unwrap();

        let req = PostRequest {
            status: Some(PostStatus::Scheduled),
            ..Default::default()
        };
        let updated = PostService::update(&repos, &DisabledImageStorage, &ann, post.id, req, None, now)
            .await
            .unwrap();
        assert_eq!(updated.status, PostStatus::Scheduled);
        assert_eq!(updated.publish_date, Some(later));
        assert!(updated.is_scheduled);
    }

    #[test]
    fn test_normalize_tags() {
        let raw = vec![
            " Rust ".to_string(),
            "".to_string(),
            "RUST".to_string(),
            "async".to_string(),
        ];
        assert_eq!(normalize_tags(&raw), vec!["rust", "async"]);
    }
}
