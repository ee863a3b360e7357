//! services/planner/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `KeyValueStore` port from the `core` crate. Each collection lives in one
//! row of a SQLite table, keyed by the collection's slot name.

use async_trait::async_trait;
use chrono::Utc;
use lesson_planner_core::ports::{KeyValueStore, PortError, PortResult};
use sqlx::SqlitePool;
use tracing::warn;

/// SQLite's result code for a full database or disk.
const SQLITE_FULL: &str = "13";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `KeyValueStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
    quota_bytes: Option<usize>,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`. With a quota, writes that would grow the total
    /// stored size beyond `quota_bytes` are refused.
    pub fn new(pool: SqlitePool, quota_bytes: Option<usize>) -> Self {
        Self { pool, quota_bytes }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn check_quota(&self, key: &str, value: &str) -> PortResult<()> {
        let Some(quota) = self.quota_bytes else {
            return Ok(());
        };
        let others: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM kv_slots WHERE key <> ?1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let needed = others.max(0) as usize + key.len() + value.len();
        if needed > quota {
            warn!(key, needed, quota, "Refusing write over the storage quota.");
            return Err(PortError::QuotaExceeded(format!(
                "{needed} bytes requested, {quota} allowed"
            )));
        }
        Ok(())
    }
}

fn map_db_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLITE_FULL) => {
            PortError::QuotaExceeded(db.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for DbAdapter {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM kv_slots WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.check_quota(key, value).await?;
        sqlx::query(
            "INSERT INTO kv_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM kv_slots WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }
}
