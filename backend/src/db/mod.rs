//! Database connection and pool management

use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Pool tuning beyond what configuration exposes
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Create the PostgreSQL pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    create_pool_with(config, &PoolSettings::default()).await
}

pub async fn create_pool_with(config: &DatabaseConfig, settings: &PoolSettings) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&config.url)
        .context("invalid database url")?
        .application_name("blog-backend");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(settings.min_connections.min(config.max_connections))
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .max_lifetime(settings.max_lifetime)
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
        .context("failed to connect to database")?;

    info!(max = config.max_connections, "Database pool created");
    Ok(pool)
}

/// Apply embedded migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run migrations")?;
    info!("Database migrations applied");
    Ok(())
}

/// Round-trip a trivial query
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        e
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.min_connections, 1);
        assert!(settings.acquire_timeout < settings.idle_timeout);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            max_connections: 1,
        };
        assert!(create_pool(&config).await.is_err());
    }
}
