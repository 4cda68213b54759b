// src/ingest/types.rs
use anyhow::Result;

/// One entry of a platform hot list, normalized across sources.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct TrendingItem {
    pub title: String,
    pub url: String,       // may be empty when the platform gives no link
    pub hot_value: String, // opaque, units differ per platform
    pub rank: u32,         // 1-based position in the source listing
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// One request against the platform. `Ok(vec![])` is a normal "nothing this round";
    /// `Err` carries transport, status or decode failures.
    async fn fetch_latest(&self) -> Result<Vec<TrendingItem>>;

    fn name(&self) -> &'static str;

    /// Never fails: adapter errors are logged and degrade to an empty list.
    async fn fetch(&self) -> Vec<TrendingItem> {
        match self.fetch_latest().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = ?e, source = self.name(), "source fetch failed");
                Vec::new()
            }
        }
    }
}
