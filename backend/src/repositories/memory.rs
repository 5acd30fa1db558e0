//! In-memory implementation of every repository trait
//!
//! One lock guards all collections so cascades and cross-collection counts
//! see a consistent view. Unique constraints mirror the SQL schema.

use super::{
    CategoryRecord, CategoryRepository, NewPost, NewTopic, NewUser, PostFilter, PostLinkRecord,
    PostRecord, PostRepository, ProfileChanges, StoreError, StoreResult, TagRecord, TopicRecord,
    TopicRepository, UserListFilter, UserRecord, UserRepository, UserSortField,
};
use async_trait::async_trait;
use blog_shared::{PostStatus, Role, UserStats};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    posts: HashMap<Uuid, PostRecord>,
    topics: HashMap<Uuid, TopicRecord>,
    categories: HashMap<Uuid, CategoryRecord>,
    tags: HashMap<Uuid, TagRecord>,
    /// Post id to tag ids, in association order
    post_tags: HashMap<Uuid, Vec<Uuid>>,
}

impl Inner {
    fn user_mut(&mut self, id: Uuid) -> StoreResult<&mut UserRecord> {
        self.users.get_mut(&id).ok_or(StoreError::NotFound("User"))
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn remove_post(&mut self, id: Uuid) {
        self.posts.remove(&id);
        self.post_tags.remove(&id);
    }
}

/// Shared in-process store. Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_search(user: &UserRecord, needle: &str) -> bool {
    [&user.first_name, &user.last_name, &user.email, &user.username]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn compare_users(a: &UserRecord, b: &UserRecord, sort: UserSortField) -> Ordering {
    match sort {
        UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        UserSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        UserSortField::FirstName => a.first_name.cmp(&b.first_name),
        UserSortField::LastName => a.last_name.cmp(&b.last_name),
        UserSortField::Email => a.email.cmp(&b.email),
        UserSortField::Username => a.username.cmp(&b.username),
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

// ============================================================================
// Users
// ============================================================================

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, new: NewUser) -> StoreResult<UserRecord> {
        let mut inner = self.inner.write().await;

        let email = new.email.to_lowercase();
        let username = new.username.to_lowercase();
        if inner.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict("User already exists".to_string()));
        }
        if inner
            .users
            .values()
            .any(|u| u.username.to_lowercase() == username)
        {
            return Err(StoreError::Conflict("Username already exists".to_string()));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: new.email,
            username: new.username,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            is_active: true,
            refresh_token: None,
            phone: None,
            address: None,
            website: None,
            bio: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.users.get(id).cloned()).collect())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let email = email.trim().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let username = username.trim().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username.to_lowercase() == username)
            .cloned())
    }

    async fn find_by_login(&self, identifier: &str) -> StoreResult<Option<UserRecord>> {
        let needle = identifier.trim().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.to_lowercase() == needle || u.username.to_lowercase() == needle)
            .cloned())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(id)?;
        user.refresh_token = token.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<UserRecord> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(id)?;

        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.phone {
            user.phone = Some(v);
        }
        if let Some(v) = changes.address {
            user.address = Some(v);
        }
        if let Some(v) = changes.website {
            user.website = Some(v);
        }
        if let Some(v) = changes.bio {
            user.bio = Some(v);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<UserRecord> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(id)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> StoreResult<UserRecord> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(id)?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.users.remove(&id).is_none() {
            return Err(StoreError::NotFound("User"));
        }

        let owned: Vec<Uuid> = inner
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            inner.remove_post(post_id);
        }
        Ok(())
    }

    async fn list(&self, filter: &UserListFilter) -> StoreResult<(Vec<(UserRecord, i64)>, i64)> {
        let inner = self.inner.read().await;
        let needle = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<&UserRecord> = inner
            .users
            .values()
            .filter(|u| needle.as_deref().map_or(true, |n| matches_search(u, n)))
            .filter(|u| filter.is_active.map_or(true, |a| u.is_active == a))
            .filter(|u| filter.role.map_or(true, |r| u.role == r))
            .collect();

        matched.sort_by(|a, b| {
            let ord = compare_users(a, b, filter.sort);
            if filter.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let total = matched.len() as i64;
        let items = page(matched, filter.limit, filter.offset)
            .into_iter()
            .map(|u| {
                let count = inner.posts.values().filter(|p| p.author_id == u.id).count();
                (u.clone(), count as i64)
            })
            .collect();

        Ok((items, total))
    }

    async fn stats(&self) -> StoreResult<UserStats> {
        let inner = self.inner.read().await;
        let mut stats = UserStats::default();
        for user in inner.users.values() {
            stats.total += 1;
            if user.is_active {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            match user.role {
                Role::User => stats.users += 1,
                Role::Moderator => stats.moderators += 1,
                Role::Admin => stats.admins += 1,
                Role::SuperAdmin => stats.super_admins += 1,
            }
        }
        Ok(stats)
    }
}

// ============================================================================
// Posts
// ============================================================================

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, new: NewPost) -> StoreResult<PostRecord> {
        let mut inner = self.inner.write().await;
        if inner.slug_taken(&new.slug, None) {
            return Err(StoreError::Conflict("Slug already exists".to_string()));
        }

        let now = Utc::now();
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: new.title,
            slug: new.slug,
            content: new.content,
            html_content: new.html_content,
            content_type: new.content_type,
            excerpt: new.excerpt,
            status: new.status,
            publish_date: new.publish_date,
            is_scheduled: new.is_scheduled,
            author_id: new.author_id,
            topic_id: new.topic_id,
            preview_image_url: new.preview_image_url,
            sort_order: new.sort_order,
            read_count: 0,
            read_time: new.read_time,
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PostRecord>> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<PostRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn update(&self, post: &PostRecord) -> StoreResult<PostRecord> {
        let mut inner = self.inner.write().await;
        if inner.slug_taken(&post.slug, Some(post.id)) {
            return Err(StoreError::Conflict("Slug already exists".to_string()));
        }

        let stored = inner
            .posts
            .get_mut(&post.id)
            .ok_or(StoreError::NotFound("Post"))?;
        let read_count = stored.read_count;
        let created_at = stored.created_at;
        *stored = PostRecord {
            read_count,
            created_at,
            updated_at: Utc::now(),
            ..post.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.posts.contains_key(&id) {
            return Err(StoreError::NotFound("Post"));
        }
        inner.remove_post(id);
        Ok(())
    }

    async fn list(&self, filter: &PostFilter) -> StoreResult<(Vec<PostRecord>, i64)> {
        let inner = self.inner.read().await;

        let tag_id = match filter.tag.as_deref() {
            Some(name) => match inner.tags.values().find(|t| t.name == name) {
                Some(tag) => Some(tag.id),
                None => return Ok((Vec::new(), 0)),
            },
            None => None,
        };

        let mut matched: Vec<PostRecord> = inner
            .posts
            .values()
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .filter(|p| filter.topic_id.map_or(true, |t| p.topic_id == Some(t)))
            .filter(|p| filter.author_id.map_or(true, |a| p.author_id == a))
            .filter(|p| {
                tag_id.map_or(true, |t| {
                    inner.post_tags.get(&p.id).is_some_and(|ids| ids.contains(&t))
                })
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = matched.len() as i64;
        Ok((page(matched, filter.limit, filter.offset), total))
    }

    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<PostRecord>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<PostRecord> = inner
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn list_scheduled_by_author(&self, author_id: Uuid) -> StoreResult<Vec<PostRecord>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<PostRecord> = inner
            .posts
            .values()
            .filter(|p| {
                p.author_id == author_id
                    && p.status == PostStatus::Scheduled
                    && p.publish_date.is_some()
            })
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.publish_date);
        Ok(posts)
    }

    async fn published_in_topic(&self, topic_id: Uuid) -> StoreResult<Vec<PostLinkRecord>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<&PostRecord> = inner
            .posts
            .values()
            .filter(|p| p.topic_id == Some(topic_id) && p.status == PostStatus::Published)
            .collect();
        posts.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(posts
            .into_iter()
            .map(|p| PostLinkRecord {
                id: p.id,
                slug: p.slug.clone(),
                title: p.title.clone(),
            })
            .collect())
    }

    async fn publish_due(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let mut published = 0;
        for post in inner.posts.values_mut() {
            let due = post.publish_date.is_some_and(|d| d <= now);
            if post.is_scheduled && post.status == PostStatus::Scheduled && due {
                post.status = PostStatus::Published;
                post.is_scheduled = false;
                post.updated_at = Utc::now();
                published += 1;
            }
        }
        Ok(published)
    }

    async fn increment_read_count(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(post) = inner.posts.get_mut(&id) {
            post.read_count += 1;
        }
        Ok(())
    }

    async fn set_tags(&self, post_id: Uuid, names: &[String]) -> StoreResult<Vec<TagRecord>> {
        let mut inner = self.inner.write().await;

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let existing = inner.tags.values().find(|t| &t.name == name).cloned();
            let tag = match existing {
                Some(tag) => tag,
                None => {
                    let tag = TagRecord {
                        id: Uuid::new_v4(),
                        name: name.clone(),
                    };
                    inner.tags.insert(tag.id, tag.clone());
                    tag
                }
            };
            tags.push(tag);
        }

        inner
            .post_tags
            .insert(post_id, tags.iter().map(|t| t.id).collect());
        Ok(tags)
    }

    async fn tags_for(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<TagRecord>>> {
        let inner = self.inner.read().await;
        let mut by_post = HashMap::new();
        for post_id in post_ids {
            if let Some(ids) = inner.post_tags.get(post_id) {
                let tags = ids
                    .iter()
                    .filter_map(|id| inner.tags.get(id).cloned())
                    .collect::<Vec<_>>();
                by_post.insert(*post_id, tags);
            }
        }
        Ok(by_post)
    }
}

// ============================================================================
// Topics and categories
// ============================================================================

#[async_trait]
impl TopicRepository for InMemoryStore {
    async fn create(&self, new: NewTopic) -> StoreResult<TopicRecord> {
        let mut inner = self.inner.write().await;
        if inner.topics.values().any(|t| t.slug == new.slug) {
            return Err(StoreError::Conflict("Topic slug already exists".to_string()));
        }

        let now = Utc::now();
        let topic = TopicRecord {
            id: Uuid::new_v4(),
            name: new.name,
            slug: new.slug,
            parent_id: new.parent_id,
            sort_order: new.sort_order,
            created_at: now,
            updated_at: now,
        };
        inner.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TopicRecord>> {
        Ok(self.inner.read().await.topics.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<TopicRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.topics.values().find(|t| t.slug == slug).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<TopicRecord>> {
        let inner = self.inner.read().await;
        let mut topics: Vec<TopicRecord> = inner.topics.values().cloned().collect();
        topics.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(topics)
    }

    async fn update(&self, topic: &TopicRecord) -> StoreResult<TopicRecord> {
        let mut inner = self.inner.write().await;
        if inner
            .topics
            .values()
            .any(|t| t.slug == topic.slug && t.id != topic.id)
        {
            return Err(StoreError::Conflict("Topic slug already exists".to_string()));
        }

        let stored = inner
            .topics
            .get_mut(&topic.id)
            .ok_or(StoreError::NotFound("Topic"))?;
        *stored = TopicRecord {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..topic.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .topics
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("Topic"))
    }

    async fn count_children(&self, id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .topics
            .values()
            .filter(|t| t.parent_id == Some(id))
            .count() as i64)
    }

    async fn count_posts(&self, id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .posts
            .values()
            .filter(|p| p.topic_id == Some(id))
            .count() as i64)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, name: &str, slug: &str) -> StoreResult<CategoryRecord> {
        let mut inner = self.inner.write().await;
        if inner
            .categories
            .values()
            .any(|c| c.name == name || c.slug == slug)
        {
            return Err(StoreError::Conflict("Category already exists".to_string()));
        }

        let category = CategoryRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Utc::now(),
        };
        inner.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list(&self) -> StoreResult<Vec<CategoryRecord>> {
        let inner = self.inner.read().await;
        let mut categories: Vec<CategoryRecord> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}
