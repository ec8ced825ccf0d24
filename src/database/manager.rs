use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Statements that bring an empty database up to the current recipes schema.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS recipes (
        recipe_id BIGSERIAL PRIMARY KEY,
        recipe_name TEXT NOT NULL,
        ingredients TEXT NOT NULL DEFAULT '',
        category_id BIGINT NOT NULL,
        created_by BIGINT NOT NULL,
        date_created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        date_modified TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS recipes_owner_category_idx
        ON recipes (created_by, category_id)
    "#,
];

/// Opens the PostgreSQL pool for the process
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect using the configured URL and pool limits
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Created database pool (max_connections={})",
            config.max_connections
        );

        if config.run_migrations {
            Self::migrate(&pool).await?;
        }

        Ok(pool)
    }

    /// Create the recipes table and its indexes when missing
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Recipes schema is up to date");
        Ok(())
    }
}
