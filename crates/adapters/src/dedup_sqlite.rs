//! SQLite dedup store implementation

use async_trait::async_trait;
use newsrelay_domain::{DedupError, DedupStore, InsertOutcome, SeenRecord};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

/// SQLite-backed dedup store
pub struct SqliteDedupStore {
    pool: SqlitePool,
}

impl SqliteDedupStore {
    /// Open (or create) the database at `db_path` and apply the schema
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, DedupError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DedupError::Backend(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, DedupError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), DedupError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_items (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                published_at TEXT NOT NULL,
                source_name TEXT NOT NULL,
                category TEXT NOT NULL,
                inserted_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DedupError::Backend(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_seen_items_inserted_at
            ON seen_items(inserted_at)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DedupError::Backend(e.to_string()))?;

        Ok(())
    }

    /// Number of recorded URLs
    pub async fn count(&self) -> Result<i64, DedupError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seen_items")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;
        Ok(count.0)
    }
}

#[async_trait]
impl DedupStore for SqliteDedupStore {
    async fn exists(&self, url: &str) -> Result<bool, DedupError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM seen_items WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn insert(&self, record: &SeenRecord) -> Result<InsertOutcome, DedupError> {
        let published_at = record
            .published_at
            .format(&Rfc3339)
            .map_err(|e| DedupError::Serialization(e.to_string()))?;
        let inserted_at = record
            .inserted_at
            .format(&Rfc3339)
            .map_err(|e| DedupError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO seen_items
            (url, title, description, published_at, source_name, category, inserted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&record.url)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&published_at)
        .bind(&record.source_name)
        .bind(&record.category)
        .bind(&inserted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DedupError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyPresent)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn health_check(&self) -> Result<(), DedupError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DedupError::Backend(e.to_string()))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
