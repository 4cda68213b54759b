// src/enrich/assets.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub const DEFAULT_PUBLIC_PREFIX: &str = "/static/screenshots";

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist a PNG and return the path clients use to fetch it.
    async fn write_screenshot(&self, png: &[u8]) -> Result<String>;
}

/// Writes into a local directory that the API serves under `/static`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    dir: PathBuf,
    public_prefix: String,
}

impl LocalAssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
        }
    }

    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Capture-time name; microsecond resolution keeps collisions out of practical reach.
fn screenshot_file_name() -> String {
    format!("screenshot_{}.png", chrono::Utc::now().timestamp_micros())
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn write_screenshot(&self, png: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating screenshot dir {}", self.dir.display()))?;
        let name = screenshot_file_name();
        let path = self.dir.join(&name);
        tokio::fs::write(&path, png)
            .await
            .with_context(|| format!("writing screenshot {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = png.len(), "screenshot stored");
        Ok(format!("{}/{}", self.public_prefix, name))
    }
}
