//! SQLite-backed key-value store for on-device persistence.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::kv::{KeyValueStore, StorageError};

/// SQLite-backed [`KeyValueStore`].
///
/// The pool is created lazily on first use so constructing the store never
/// touches the filesystem. The handle is cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Arc<Mutex<Option<SqlitePool>>>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Store backed by the default on-device database,
    /// `{app_data_dir}/toolkart/storage.db`.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::at_path(default_db_path()?))
    }

    /// Store backed by an explicit database path (tests, custom layouts).
    pub fn at_path(db_path: PathBuf) -> Self {
        Self {
            pool: Arc::new(Mutex::new(None)),
            db_path,
        }
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<()> {
        let mut pool_guard = self.pool.lock().await;
        if pool_guard.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create storage directory at {parent:?}"))?;
        }

        // mode=rwc: create the database file on first run.
        let db_url = format!("sqlite://{}?mode=rwc", self.db_path.to_string_lossy());

        let pool = SqlitePool::connect(&db_url)
            .await
            .with_context(|| format!("failed to open SQLite store at {:?}", self.db_path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create kv_store table")?;

        *pool_guard = Some(pool);
        Ok(())
    }

    /// Get the pool, initializing if necessary.
    async fn get_pool(&self) -> anyhow::Result<SqlitePool> {
        self.ensure_initialized().await?;
        let pool_guard = self.pool.lock().await;
        match pool_guard.as_ref() {
            Some(pool) => Ok(pool.clone()),
            None => Err(anyhow::anyhow!("SQLite pool missing after initialization")),
        }
    }

    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let pool = self.get_pool().await?;

        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&pool)
            .await
            .with_context(|| format!("failed to read key '{key}'"))?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&pool)
        .await
        .with_context(|| format!("failed to upsert key '{key}'"))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;

        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&pool)
            .await
            .with_context(|| format!("failed to delete key '{key}'"))?;

        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.read(key)
            .await
            .map_err(|e| StorageError::Backend(format!("{e:#}")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, value)
            .await
            .map_err(|e| StorageError::Backend(format!("{e:#}")))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.delete(key)
            .await
            .map_err(|e| StorageError::Backend(format!("{e:#}")))
    }
}

/// Resolve the path to the on-device database:
/// `{app_data_dir}/toolkart/storage.db`.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory")?;

    let mut path = base;
    path.push("toolkart");
    path.push("storage.db");
    Ok(path)
}
