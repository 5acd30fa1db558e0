//! Topic repository for database operations

use super::{map_sqlx, StoreError, StoreResult, TopicRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const TOPIC_COLUMNS: &str = "id, name, slug, parent_id, sort_order, created_at, updated_at";

/// Topic record from database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TopicRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a topic
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

/// PostgreSQL-backed [`TopicRepository`]
#[derive(Clone)]
pub struct PgTopicRepository {
    pool: PgPool,
}

impl PgTopicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SLUG_TAKEN: &str = "Topic slug already exists";

#[async_trait]
impl TopicRepository for PgTopicRepository {
    async fn create(&self, new: NewTopic) -> StoreResult<TopicRecord> {
        let sql = format!(
            "INSERT INTO topics (name, slug, parent_id, sort_order) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            TOPIC_COLUMNS
        );
        sqlx::query_as::<_, TopicRecord>(&sql)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(new.parent_id)
            .bind(new.sort_order)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, SLUG_TAKEN))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<TopicRecord>> {
        let sql = format!("SELECT {} FROM topics WHERE id = $1", TOPIC_COLUMNS);
        Ok(sqlx::query_as::<_, TopicRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<TopicRecord>> {
        let sql = format!("SELECT {} FROM topics WHERE slug = $1", TOPIC_COLUMNS);
        Ok(sqlx::query_as::<_, TopicRecord>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self) -> StoreResult<Vec<TopicRecord>> {
        let sql = format!("SELECT {} FROM topics ORDER BY sort_order ASC, name ASC", TOPIC_COLUMNS);
        Ok(sqlx::query_as::<_, TopicRecord>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, topic: &TopicRecord) -> StoreResult<TopicRecord> {
        let sql = format!(
            "UPDATE topics SET name = $2, slug = $3, parent_id = $4, sort_order = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            TOPIC_COLUMNS
        );
        sqlx::query_as::<_, TopicRecord>(&sql)
            .bind(topic.id)
            .bind(&topic.name)
            .bind(&topic.slug)
            .bind(topic.parent_id)
            .bind(topic.sort_order)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, SLUG_TAKEN))?
            .ok_or(StoreError::NotFound("Topic"))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Topic"));
        }
        Ok(())
    }

    async fn count_children(&self, id: Uuid) -> StoreResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM topics WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_posts(&self, id: Uuid) -> StoreResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE topic_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }
}
