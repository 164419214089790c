use std::{collections::HashSet, str::FromStr};

use async_trait::async_trait;
use log::*;
use sb_common::Platform;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row,
    SqlitePool,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The durable idempotency ledger: named sets of order ids that have already
/// been acted upon. Two logical sets exist per platform - new-order
/// notifications and overdue escalations - and membership must survive
/// restarts.
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn members(&self, set_name: &str) -> Result<HashSet<String>, StoreError>;

    /// Atomic add-if-absent. Returns `true` when the member was newly
    /// inserted.
    async fn add(&self, set_name: &str, member: &str) -> Result<bool, StoreError>;
}

pub fn sent_orders_key(platform: Platform) -> String {
    format!("sent_orders_{platform}")
}

pub fn overdue_notified_key(platform: Platform) -> String {
    format!("overdue_notified_{platform}")
}

/// SQLite-backed set store. One row per (set, member) pair; the primary key
/// makes `add` an atomic add-if-absent.
#[derive(Clone)]
pub struct SqliteDedupStore {
    pool: SqlitePool,
}

impl SqliteDedupStore {
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        trace!("🗃️ Opening dedup store at {url}");
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS dedup_sets (\
                 set_name TEXT NOT NULL,\
                 member TEXT NOT NULL,\
                 PRIMARY KEY (set_name, member)\
             )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DedupStore for SqliteDedupStore {
    async fn members(&self, set_name: &str) -> Result<HashSet<String>, StoreError> {
        let rows = sqlx::query("SELECT member FROM dedup_sets WHERE set_name = ?")
            .bind(set_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.get::<String, _>(0)).collect())
    }

    async fn add(&self, set_name: &str, member: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("INSERT OR IGNORE INTO dedup_sets (set_name, member) VALUES (?, ?)")
            .bind(set_name)
            .bind(member)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
