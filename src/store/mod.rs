// src/store/mod.rs
//! Persistence boundary for captured hotspots.
//!
//! The crawler only appends rows through a batch and later patches the three
//! enrichment columns by id; everything else here serves the read/delete API.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A persisted capture. Enrichment columns stay `None` until details are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HotspotRecord {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub url: String,
    pub rank: i64,
    pub hot_value: String,
    pub created_at: DateTime<Utc>,
    pub content: Option<String>,
    pub media_paths: Option<String>,
    pub summary: Option<String>,
}

/// Row as produced by a crawl, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHotspot {
    pub source: String,
    pub title: String,
    pub url: String,
    pub rank: i64,
    pub hot_value: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait HotspotStore: Send + Sync {
    /// Open an all-or-nothing batch of inserts.
    async fn begin_batch(&self) -> Result<Box<dyn HotspotBatch>>;

    /// Patch `content`/`media_paths`/`summary` of one row. `false` when the id is unknown.
    async fn update_enrichment(
        &self,
        id: i64,
        content: &str,
        media_paths: Option<&str>,
        summary: &str,
    ) -> Result<bool>;

    async fn get(&self, id: i64) -> Result<Option<HotspotRecord>>;

    /// Newest captures first, optionally for one source.
    async fn list(&self, source: Option<&str>, limit: i64) -> Result<Vec<HotspotRecord>>;

    async fn sources(&self) -> Result<Vec<String>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn delete_many(&self, ids: &[i64]) -> Result<u64>;
}

#[async_trait::async_trait]
pub trait HotspotBatch: Send {
    async fn insert(&mut self, rec: &NewHotspot) -> Result<i64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
