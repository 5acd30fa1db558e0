//! Flat category service

use crate::error::{ApiError, ApiResult};
use crate::repositories::{CategoryRecord, CategoryRepository, StoreError};
use blog_shared::text::slug_base;
use blog_shared::validation::validate_slug;
use blog_shared::{CategoryRequest, CategoryResponse, ConflictCode};
use tracing::info;

pub struct CategoryService;

impl CategoryService {
    /// Create a category; the slug defaults to one derived from the name
    pub async fn create(
        categories: &dyn CategoryRepository,
        req: CategoryRequest,
    ) -> ApiResult<CategoryResponse> {
        let name = req
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::field("name", "Name is required"))?;
        let slug = match req.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => slug.to_lowercase(),
            None => slug_base(name),
        };
        validate_slug(&slug).map_err(|e| ApiError::field("slug", e))?;

        let category = categories.create(name, &slug).await.map_err(|e| match e {
            StoreError::Conflict(_) => {
                ApiError::conflict(ConflictCode::Conflict, "Category already exists")
            }
            other => other.into(),
        })?;

        info!(category_id = %category.id, "Category created");
        Ok(to_response(category))
    }

    pub async fn list(categories: &dyn CategoryRepository) -> ApiResult<Vec<CategoryResponse>> {
        Ok(categories.list().await?.into_iter().map(to_response).collect())
    }
}

fn to_response(category: CategoryRecord) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name,
        slug: category.slug,
        created_at: category.created_at,
    }
}
