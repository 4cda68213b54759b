// src/store/memory.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{HotspotBatch, HotspotRecord, HotspotStore, NewHotspot};

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<HotspotRecord>,
    next_id: i64,
}

/// Process-local store for tests and dry runs. `fail_commits(true)` makes every
/// batch commit fail so callers can observe the rollback path.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_commits(&self, on: bool) {
        self.fail_commit.store(on, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<HotspotRecord> {
        match self.inner.lock() {
            Ok(inner) => inner.rows.clone(),
            Err(poisoned) => poisoned.into_inner().rows.clone(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))
    }
}

struct MemoryBatch {
    store: MemoryStore,
    staged: Vec<HotspotRecord>,
}

#[async_trait]
impl HotspotBatch for MemoryBatch {
    async fn insert(&mut self, rec: &NewHotspot) -> Result<i64> {
        let id = {
            let mut inner = self.store.lock()?;
            inner.next_id += 1;
            inner.next_id
        };
        self.staged.push(HotspotRecord {
            id,
            source: rec.source.clone(),
            title: rec.title.clone(),
            url: rec.url.clone(),
            rank: rec.rank,
            hot_value: rec.hot_value.clone(),
            created_at: rec.created_at,
            content: None,
            media_paths: None,
            summary: None,
        });
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryBatch { store, staged } = *self;
        if store.fail_commit.load(Ordering::SeqCst) {
            return Err(anyhow!("commit rejected by store"));
        }
        store.lock()?.rows.extend(staged);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl HotspotStore for MemoryStore {
    async fn begin_batch(&self) -> Result<Box<dyn HotspotBatch>> {
        Ok(Box::new(MemoryBatch {
            store: self.clone(),
            staged: Vec::new(),
        }))
    }

    async fn update_enrichment(
        &self,
        id: i64,
        content: &str,
        media_paths: Option<&str>,
        summary: &str,
    ) -> Result<bool> {
        let mut inner = self.lock()?;
        match inner.rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.content = Some(content.to_string());
                row.media_paths = media_paths.map(str::to_string);
                row.summary = Some(summary.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: i64) -> Result<Option<HotspotRecord>> {
        Ok(self.lock()?.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, source: Option<&str>, limit: i64) -> Result<Vec<HotspotRecord>> {
        let inner = self.lock()?;
        let mut rows: Vec<_> = inner
            .rows
            .iter()
            .filter(|r| source.map_or(true, |s| r.source == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn sources(&self) -> Result<Vec<String>> {
        let inner = self.lock()?;
        let set: std::collections::BTreeSet<String> =
            inner.rows.iter().map(|r| r.source.clone()).collect();
        Ok(set.into_iter().collect())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.lock()?;
        let before = inner.rows.len();
        inner.rows.retain(|r| r.id != id);
        Ok(inner.rows.len() < before)
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        let mut inner = self.lock()?;
        let before = inner.rows.len();
        inner.rows.retain(|r| !ids.contains(&r.id));
        Ok((before - inner.rows.len()) as u64)
    }
}
