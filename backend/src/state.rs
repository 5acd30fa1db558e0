//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! Everything here is built once at startup and cloned per request; every
//! field is an `Arc` or already cheap to clone.

use crate::auth::{RefreshCookie, TokenService};
use crate::config::AppConfig;
use crate::repositories::{
    CategoryRepository, InMemoryStore, PgCategoryRepository, PgPostRepository, PgTopicRepository,
    PgUserRepository, PostRepository, TopicRepository, UserRepository,
};
use crate::services::storage::{image_storage_from_config, ImageStorage};
use sqlx::PgPool;
use std::sync::Arc;

/// Repository handles shared by all handlers
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub categories: Arc<dyn CategoryRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            topics: Arc::new(PgTopicRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool)),
        }
    }

    /// All repositories backed by one in-memory store
    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            posts: Arc::new(store.clone()),
            topics: Arc::new(store.clone()),
            categories: Arc::new(store),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database pool, absent when running on the in-memory store
    pub db: Option<PgPool>,
    pub repos: Repositories,
    pub config: Arc<AppConfig>,
    /// Pre-initialized token service with cached keys
    pub jwt: TokenService,
    pub images: Arc<dyn ImageStorage>,
    pub cookies: RefreshCookie,
}

impl AppState {
    /// Create application state on top of PostgreSQL
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        let repos = Repositories::postgres(db.clone());
        Self::build(Some(db), repos, config)
    }

    /// Create application state on top of a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> Self {
        Self::with_store(InMemoryStore::new(), config)
    }

    /// Create application state on top of a given in-memory store
    pub fn with_store(store: InMemoryStore, config: AppConfig) -> Self {
        Self::build(None, Repositories::in_memory(store), config)
    }

    /// Replace the image storage backend
    pub fn with_image_storage(mut self, images: Arc<dyn ImageStorage>) -> Self {
        self.images = images;
        self
    }

    fn build(db: Option<PgPool>, repos: Repositories, config: AppConfig) -> Self {
        let jwt = TokenService::new(&config.jwt);
        // The cookie lives exactly as long as the refresh token it carries
        let cookies = RefreshCookie::new(AppConfig::is_production(), jwt.refresh_ttl_secs());
        let images = image_storage_from_config(&config.storage);

        Self {
            db,
            repos,
            config: Arc::new(config),
            jwt,
            images,
            cookies,
        }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the token service
    #[inline]
    pub fn jwt(&self) -> &TokenService {
        &self.jwt
    }

    /// bcrypt cost in effect
    #[inline]
    pub fn bcrypt_cost(&self) -> u32 {
        self.config.security.effective_bcrypt_cost()
    }
}
