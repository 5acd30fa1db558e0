//! Post and tag repository for database operations

use super::{map_sqlx, PostRepository, StoreError, StoreResult};
use async_trait::async_trait;
use blog_shared::{ContentType, PostStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, title, slug, content, html_content, content_type, excerpt, \
     status, publish_date, is_scheduled, author_id, topic_id, preview_image_url, sort_order, \
     read_count, read_time, created_at, updated_at";

/// Post record from database
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
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
    pub author_id: Uuid,
    pub topic_id: Option<Uuid>,
    pub preview_image_url: Option<String>,
    pub sort_order: i32,
    pub read_count: i64,
    /// Minutes, derived from `content`
    pub read_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub html_content: Option<String>,
    pub content_type: ContentType,
    pub excerpt: Option<String>,
    pub status: PostStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_scheduled: bool,
    pub author_id: Uuid,
    pub topic_id: Option<Uuid>,
    pub preview_image_url: Option<String>,
    pub sort_order: i32,
    pub read_time: i32,
}

/// Post listing filter
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub topic_id: Option<Uuid>,
    /// Lowercased tag name
    pub tag: Option<String>,
    pub author_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

/// Minimal post reference used for navigation
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PostLinkRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
}

/// Tag record from database
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TagRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    slug: String,
    content: String,
    html_content: Option<String>,
    content_type: String,
    excerpt: Option<String>,
    status: String,
    publish_date: Option<DateTime<Utc>>,
    is_scheduled: bool,
    author_id: Uuid,
    topic_id: Option<Uuid>,
    preview_image_url: Option<String>,
    sort_order: i32,
    read_count: i64,
    read_time: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            html_content: row.html_content,
            content_type: row.content_type.parse().unwrap_or_default(),
            excerpt: row.excerpt,
            status: row.status.parse().unwrap_or_default(),
            publish_date: row.publish_date,
            is_scheduled: row.is_scheduled,
            author_id: row.author_id,
            topic_id: row.topic_id,
            preview_image_url: row.preview_image_url,
            sort_order: row.sort_order,
            read_count: row.read_count,
            read_time: row.read_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: Uuid,
    id: Uuid,
    name: String,
}

/// PostgreSQL-backed [`PostRepository`]
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SLUG_TAKEN: &str = "Slug already exists";

/// Shared WHERE clause for listing: $1 status, $2 topic, $3 author, $4 tag
const LIST_FILTER: &str = r#"
    WHERE ($1::text IS NULL OR status = $1)
      AND ($2::uuid IS NULL OR topic_id = $2)
      AND ($3::uuid IS NULL OR author_id = $3)
      AND ($4::text IS NULL OR EXISTS (
            SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = posts.id AND t.name = $4))
"#;

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, new: NewPost) -> StoreResult<PostRecord> {
        let sql = format!(
            r#"
            INSERT INTO posts (title, slug, content, html_content, content_type, excerpt, status,
                               publish_date, is_scheduled, author_id, topic_id,
                               preview_image_url, sort_order, read_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&new.title)
            .bind(&new.slug)
            .bind(&new.content)
            .bind(&new.html_content)
            .bind(new.content_type.as_str())
            .bind(&new.excerpt)
            .bind(new.status.as_str())
            .bind(new.publish_date)
            .bind(new.is_scheduled)
            .bind(new.author_id)
            .bind(new.topic_id)
            .bind(&new.preview_image_url)
            .bind(new.sort_order)
            .bind(new.read_time)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, SLUG_TAKEN))?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PostRecord>> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<PostRecord>> {
        let sql = format!("SELECT {} FROM posts WHERE slug = $1", POST_COLUMNS);
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn update(&self, post: &PostRecord) -> StoreResult<PostRecord> {
        let sql = format!(
            r#"
            UPDATE posts SET
                title = $2, slug = $3, content = $4, html_content = $5, content_type = $6,
                excerpt = $7, status = $8, publish_date = $9, is_scheduled = $10,
                topic_id = $11, preview_image_url = $12, sort_order = $13, read_time = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post.id)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.content)
            .bind(&post.html_content)
            .bind(post.content_type.as_str())
            .bind(&post.excerpt)
            .bind(post.status.as_str())
            .bind(post.publish_date)
            .bind(post.is_scheduled)
            .bind(post.topic_id)
            .bind(&post.preview_image_url)
            .bind(post.sort_order)
            .bind(post.read_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, SLUG_TAKEN))?
            .ok_or(StoreError::NotFound("Post"))?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Post"));
        }
        Ok(())
    }

    async fn list(&self, filter: &PostFilter) -> StoreResult<(Vec<PostRecord>, i64)> {
        let status = filter.status.map(|s| s.as_str());

        let count_sql = format!("SELECT COUNT(*) FROM posts {}", LIST_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(status)
            .bind(filter.topic_id)
            .bind(filter.author_id)
            .bind(filter.tag.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let page_sql = format!(
            "SELECT {} FROM posts {} ORDER BY created_at DESC, id LIMIT $5 OFFSET $6",
            POST_COLUMNS, LIST_FILTER
        );
        let rows = sqlx::query_as::<_, PostRow>(&page_sql)
            .bind(status)
            .bind(filter.topic_id)
            .bind(filter.author_id)
            .bind(filter.tag.as_deref())
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn list_by_author(&self, author_id: Uuid) -> StoreResult<Vec<PostRecord>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE author_id = $1 ORDER BY created_at DESC",
            POST_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_scheduled_by_author(&self, author_id: Uuid) -> StoreResult<Vec<PostRecord>> {
        let sql = format!(
            "SELECT {} FROM posts \
             WHERE author_id = $1 AND status = 'SCHEDULED' AND publish_date IS NOT NULL \
             ORDER BY publish_date ASC",
            POST_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn published_in_topic(&self, topic_id: Uuid) -> StoreResult<Vec<PostLinkRecord>> {
        let rows = sqlx::query_as::<_, PostLinkRecord>(
            r#"
            SELECT id, slug, title FROM posts
            WHERE topic_id = $1 AND status = 'PUBLISHED'
            ORDER BY sort_order ASC, created_at ASC
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn publish_due(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET status = 'PUBLISHED', is_scheduled = FALSE, updated_at = NOW()
            WHERE is_scheduled = TRUE AND status = 'SCHEDULED' AND publish_date <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn increment_read_count(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE posts SET read_count = read_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_tags(&self, post_id: Uuid, names: &[String]) -> StoreResult<Vec<TagRecord>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        let mut tags = Vec::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            let tag = sqlx::query_as::<_, TagRecord>(
                r#"
                INSERT INTO tags (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id, name
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO post_tags (post_id, tag_id, position) VALUES ($1, $2, $3)")
                .bind(post_id)
                .bind(tag.id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;

            tags.push(tag);
        }

        tx.commit().await?;
        Ok(tags)
    }

    async fn tags_for(&self, post_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<TagRecord>>> {
        let rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT pt.post_id, t.id, t.name
            FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY pt.post_id, pt.position
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<Uuid, Vec<TagRecord>> = HashMap::new();
        for row in rows {
            by_post.entry(row.post_id).or_default().push(TagRecord {
                id: row.id,
                name: row.name,
            });
        }
        Ok(by_post)
    }
}
