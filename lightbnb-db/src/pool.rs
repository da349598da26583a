//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Create a PostgreSQL connection pool from resolved settings.
///
/// # Errors
///
/// Returns an error if the settings are unusable or the first
/// connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DatabaseConfig::load()?).await?;
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    create_pool_with_options(config, config.max_connections).await
}

/// Create a PostgreSQL connection pool with a custom connection limit.
pub async fn create_pool_with_options(
    config: &DatabaseConfig,
    max_connections: u32,
) -> Result<PgPool> {
    let options = config.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    info!(max_connections, "Connected to PostgreSQL");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p lightbnb-db -- --ignored

    fn url_config() -> DatabaseConfig {
        DatabaseConfig {
            url: Some(std::env::var("DATABASE_URL").expect("DATABASE_URL required")),
            ..DatabaseConfig::default()
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let pool = create_pool(&url_config()).await.expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_pool_access() {
        let pool = create_pool_with_options(&url_config(), 3)
            .await
            .expect("pool creation failed");

        // More tasks than connections; each waits its turn
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    let result: (i32,) = sqlx::query_as("SELECT $1::int")
                        .bind(i)
                        .fetch_one(&pool)
                        .await
                        .expect("concurrent query failed");
                    result.0
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.expect("task panicked");
            assert_eq!(result, i as i32);
        }
    }

    #[tokio::test]
    async fn unparseable_url_is_rejected_before_connecting() {
        let config = DatabaseConfig {
            url: Some("not a url".to_string()),
            ..DatabaseConfig::default()
        };
        assert!(create_pool(&config).await.is_err());
    }
}
