// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::ingest::types::{SourceAdapter, TrendingItem};
use crate::store::{HotspotStore, NewHotspot};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("crawl_runs_total", "Aggregation runs started.");
        describe_counter!(
            "crawl_source_items_total",
            "Items kept per source after normalization."
        );
        describe_counter!(
            "crawl_source_errors_total",
            "Source fetch/parse errors (non-fatal to the run)."
        );
        describe_counter!(
            "crawl_commit_failures_total",
            "Runs rolled back because the batch could not be persisted."
        );
        describe_histogram!("crawl_fetch_ms", "Hot-list request time in milliseconds.");
        describe_gauge!(
            "crawl_last_run_ts",
            "Unix ts when the last run committed."
        );
    });
}

/// How a single source fared in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Fetched { items: usize },
    Empty,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub total_persisted: usize,
    pub sources: Vec<SourceReport>,
}

/// Drives every registered source once per run and persists the result as one batch.
pub struct AggregationRunner {
    store: Arc<dyn HotspotStore>,
    adapters: Vec<Box<dyn SourceAdapter>>,
    parallel: bool,
}

impl AggregationRunner {
    pub fn new(store: Arc<dyn HotspotStore>, adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            store,
            adapters,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Fetch all sources, then insert and commit in one batch.
    ///
    /// A failing source only costs its own items. A failing insert or commit rolls the
    /// whole batch back and is returned as an error.
    pub async fn run_once(&self) -> Result<RunSummary> {
        ensure_metrics_described();
        counter!("crawl_runs_total").increment(1);

        let started_at = Utc::now();
        info!(sources = self.adapters.len(), parallel = self.parallel, "crawl run starting");

        let fetched = self.fetch_all().await;

        let mut reports = Vec::with_capacity(fetched.len());
        let mut records = Vec::new();
        for (source, result) in fetched {
            let outcome = match result {
                Ok(items) => {
                    let rows = to_records(source, items, started_at);
                    counter!("crawl_source_items_total", "source" => source)
                        .increment(rows.len() as u64);
                    if rows.is_empty() {
                        warn!(source, "no data returned");
                        SourceOutcome::Empty
                    } else {
                        info!(source, count = rows.len(), "source fetched");
                        let n = rows.len();
                        records.extend(rows);
                        SourceOutcome::Fetched { items: n }
                    }
                }
                Err(e) => {
                    warn!(source, error = ?e, "source failed; continuing with the rest");
                    counter!("crawl_source_errors_total", "source" => source).increment(1);
                    SourceOutcome::Failed {
                        error: format!("{e:#}"),
                    }
                }
            };
            reports.push(SourceReport {
                source: source.to_string(),
                outcome,
            });
        }

        let total_persisted = match self.persist(&records).await {
            Ok(n) => n,
            Err(e) => {
                counter!("crawl_commit_failures_total").increment(1);
                error!(error = ?e, attempted = records.len(), "crawl run rolled back");
                return Err(e);
            }
        };

        gauge!("crawl_last_run_ts").set(Utc::now().timestamp() as f64);
        info!(total = total_persisted, "crawl run completed");

        Ok(RunSummary {
            started_at,
            total_persisted,
            sources: reports,
        })
    }

    /// Results come back in registry order regardless of execution mode.
    async fn fetch_all(&self) -> Vec<(&'static str, Result<Vec<TrendingItem>>)> {
        if self.parallel {
            futures::future::join_all(
                self.adapters
                    .iter()
                    .map(|a| async move { (a.name(), fetch_isolated(a.as_ref()).await) }),
            )
            .await
        } else {
            let mut out = Vec::with_capacity(self.adapters.len());
            for a in &self.adapters {
                info!(source = a.name(), "fetching");
                out.push((a.name(), fetch_isolated(a.as_ref()).await));
            }
            out
        }
    }

    async fn persist(&self, records: &[NewHotspot]) -> Result<usize> {
        let mut batch = self.store.begin_batch().await?;
        for rec in records {
            if let Err(e) = batch.insert(rec).await {
                if let Err(rb) = batch.rollback().await {
                    warn!(error = ?rb, "rollback after failed insert also failed");
                }
                return Err(e);
            }
        }
        // A failed commit leaves nothing behind: the batch is consumed and never applied.
        batch.commit().await.context("committing crawl batch")?;
        Ok(records.len())
    }
}

/// A panicking adapter is reported like any other failed source.
async fn fetch_isolated(adapter: &dyn SourceAdapter) -> Result<Vec<TrendingItem>> {
    match AssertUnwindSafe(adapter.fetch_latest()).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(anyhow!(
            "{} panicked: {}",
            adapter.name(),
            panic_message(&*payload)
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Rows for one source: untitled items skipped, ranks renumbered 1.. in listing order.
pub fn to_records(
    source: &str,
    items: Vec<TrendingItem>,
    created_at: DateTime<Utc>,
) -> Vec<NewHotspot> {
    items
        .into_iter()
        .filter(|it| !it.title.trim().is_empty())
        .enumerate()
        .map(|(i, it)| NewHotspot {
            source: source.to_string(),
            title: it.title,
            url: it.url,
            rank: i as i64 + 1,
            hot_value: it.hot_value,
            created_at,
        })
        .collect()
}
