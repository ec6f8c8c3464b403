//! Persistent key-value cache.
//!
//! Holds best-effort values mirrored from chain, currently only the last
//! known transaction count. Nothing in here is authoritative.

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::BridgeError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BridgeError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), BridgeError>;
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.entries.lock().insert(key.to_string(), value.to_string());
        store
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BridgeError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed store, one row per key.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new_with_url(database_url: &str) -> Result<Self, BridgeError> {
        let mut db_url = database_url.to_string();
        if db_url.starts_with("sqlite:") && !db_url.starts_with("sqlite://") {
            db_url = db_url.replacen("sqlite:", "sqlite://", 1);
        }
        let is_memory = db_url.contains(":memory:");

        // ensure parent directory exists for file-backed URLs
        if !is_memory {
            if let Some(path) = db_url.strip_prefix("sqlite://") {
                let path_only = path.split('?').next().unwrap_or(path);
                if let Some(parent) = std::path::Path::new(path_only).parent() {
                    if !parent.as_os_str().is_empty() {
                        if let Err(e) = std::fs::create_dir_all(parent) {
                            warn!("Failed to create database dir {:?}: {}", parent, e);
                        }
                    }
                }
            }
        }

        let connect_options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| BridgeError::Storage(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        // every in-memory connection is a separate database
        let max_connections = if is_memory { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_options)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to database: {}", e)))?;

        let store = Self { pool };
        store.initialize_schema().await?;

        info!(in_memory = is_memory, "Cache storage initialized");
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), BridgeError> {
        debug!("Initializing cache schema");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_cache (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to create kv_cache table: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BridgeError> {
        let row = sqlx::query("SELECT value FROM kv_cache WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        sqlx::query(
            r#"
            INSERT INTO kv_cache (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(key, "Cache entry written");
        Ok(())
    }
}
