//! Category repository for database operations

use super::{map_sqlx, CategoryRepository, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Category record from database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// PostgreSQL-backed [`CategoryRepository`]
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, name: &str, slug: &str) -> StoreResult<CategoryRecord> {
        sqlx::query_as::<_, CategoryRecord>(
            r#"
            INSERT INTO categories (name, slug) VALUES ($1, $2)
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Category already exists"))
    }

    async fn list(&self) -> StoreResult<Vec<CategoryRecord>> {
        Ok(sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, slug, created_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
