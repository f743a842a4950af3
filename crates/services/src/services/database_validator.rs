//! Checks that the store is reachable and carries the schema the API reads.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

pub const REQUIRED_TABLES: &[&str] = &["sales", "strains", "ai_parsing_logs"];
pub const REQUIRED_VIEWS: &[&str] = &["historic_profits"];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct ValidationResult {
    pub is_initialized: bool,
    pub migrations_applied: i64,
    pub latest_migration: Option<String>,
    pub missing_objects: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.is_initialized && self.missing_objects.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.is_initialized {
            "Database not initialized - migrations need to be run".to_string()
        } else if !self.missing_objects.is_empty() {
            format!("Database missing: {}", self.missing_objects.join(", "))
        } else {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        }
    }
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fails only when the store cannot be queried at all.
    pub async fn validate(&self) -> Result<ValidationResult, DatabaseValidationError> {
        let is_initialized = self.object_exists("table", "_sqlx_migrations").await?;
        if !is_initialized {
            warn!("Database not initialized - _sqlx_migrations table does not exist");
            return Ok(ValidationResult {
                is_initialized,
                migrations_applied: 0,
                latest_migration: None,
                missing_objects: Vec::new(),
            });
        }

        let migrations_applied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        let latest_migration = sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let mut missing_objects = Vec::new();
        for (kind, names) in [("table", REQUIRED_TABLES), ("view", REQUIRED_VIEWS)] {
            for name in names {
                if !self.object_exists(kind, name).await? {
                    missing_objects.push((*name).to_string());
                }
            }
        }

        let result = ValidationResult {
            is_initialized,
            migrations_applied,
            latest_migration,
            missing_objects,
        };
        if result.is_ok() {
            info!(migrations_applied, "Database validation complete");
        } else {
            warn!(missing = ?result.missing_objects, "Database schema incomplete");
        }
        Ok(result)
    }

    async fn object_exists(&self, kind: &str, name: &str) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = $1 AND name = $2",
        )
        .bind(kind)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}
