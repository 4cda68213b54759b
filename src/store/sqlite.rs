// src/store/sqlite.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::time::Duration;
use tracing::{debug, info};

use super::{HotspotBatch, HotspotRecord, HotspotStore, NewHotspot};

const SELECT_COLUMNS: &str =
    "SELECT id, source, title, url, rank, hot_value, created_at, content, media_paths, summary FROM hotspots";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect (creating the file for `?mode=rwc` urls) and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        let store = Self { pool };
        store.create_tables().await?;
        info!(database_url, "hotspot store ready");
        Ok(store)
    }

    /// Private in-memory database; a single connection kept alive for the pool's lifetime.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await
            .context("opening in-memory sqlite")?;
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hotspots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                url TEXT NOT NULL DEFAULT '',
                rank INTEGER NOT NULL,
                hot_value TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                content TEXT,
                media_paths TEXT,
                summary TEXT
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .context("creating hotspots table")?;

        // Databases created before enrichment existed lack these columns.
        for column in ["content", "media_paths", "summary"] {
            let added = sqlx::query(&format!("ALTER TABLE hotspots ADD COLUMN {column} TEXT"))
                .execute(&self.pool)
                .await
                .is_ok();
            if added {
                info!(column, "added enrichment column");
            }
        }

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_hotspots_source ON hotspots(source)")
            .execute(&self.pool)
            .await
            .context("creating source index")?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_hotspots_created_at ON hotspots(created_at)")
            .execute(&self.pool)
            .await
            .context("creating created_at index")?;
        Ok(())
    }
}

struct SqliteBatch {
    tx: Transaction<'static, Sqlite>,
    inserted: usize,
}

#[async_trait]
impl HotspotBatch for SqliteBatch {
    async fn insert(&mut self, rec: &NewHotspot) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO hotspots (source, title, url, rank, hot_value, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&rec.source)
        .bind(&rec.title)
        .bind(&rec.url)
        .bind(rec.rank)
        .bind(&rec.hot_value)
        .bind(rec.created_at)
        .execute(&mut *self.tx)
        .await
        .with_context(|| format!("inserting hotspot from {}", rec.source))?
        .last_insert_rowid();
        self.inserted += 1;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let n = self.inserted;
        self.tx.commit().await.context("committing hotspot batch")?;
        debug!(rows = n, "hotspot batch committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.context("rolling back hotspot batch")
    }
}

#[async_trait]
impl HotspotStore for SqliteStore {
    async fn begin_batch(&self) -> Result<Box<dyn HotspotBatch>> {
        let tx = self.pool.begin().await.context("beginning hotspot batch")?;
        Ok(Box::new(SqliteBatch { tx, inserted: 0 }))
    }

    async fn update_enrichment(
        &self,
        id: i64,
        content: &str,
        media_paths: Option<&str>,
        summary: &str,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE hotspots SET content = ?, media_paths = ?, summary = ? WHERE id = ?",
        )
        .bind(content)
        .bind(media_paths)
        .bind(summary)
        .bind(id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("updating enrichment of hotspot {id}"))?;
        Ok(res.rows_affected() > 0)
    }

    async fn get(&self, id: i64) -> Result<Option<HotspotRecord>> {
        sqlx::query_as::<_, HotspotRecord>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading hotspot {id}"))
    }

    async fn list(&self, source: Option<&str>, limit: i64) -> Result<Vec<HotspotRecord>> {
        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        if let Some(source) = source {
            qb.push(" WHERE source = ").push_bind(source);
        }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit.max(0));
        qb.build_query_as::<HotspotRecord>()
            .fetch_all(&self.pool)
            .await
            .context("listing hotspots")
    }

    async fn sources(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT source FROM hotspots ORDER BY source")
                .fetch_all(&self.pool)
                .await
                .context("listing sources")?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM hotspots WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting hotspot {id}"))?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM hotspots WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        sep.push_unseparated(")");
        let res = qb
            .build()
            .execute(&self.pool)
            .await
            .context("deleting hotspots")?;
        Ok(res.rows_affected())
    }
}
