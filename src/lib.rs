// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod enrich;
pub mod ingest;
pub mod metrics;
pub mod store;

pub use crate::api::create_router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::api::AppState;
use crate::config::CrawlerConfig;
use crate::enrich::assets::LocalAssetStore;
use crate::enrich::browser::ChromeDriver;
use crate::enrich::DetailEnricher;
use crate::ingest::scheduler::SchedulerStatus;
use crate::ingest::AggregationRunner;
use crate::store::{HotspotStore, SqliteStore};

/// Composition root: opens the store and wires the live sources, the browser
/// driver and the screenshot directory into one `AppState`.
pub async fn build_state(cfg: &CrawlerConfig) -> Result<AppState> {
    let store: Arc<dyn HotspotStore> = Arc::new(SqliteStore::connect(&cfg.database_url).await?);

    let adapters = ingest::providers::default_registry(&cfg.fetch)?;
    let runner = AggregationRunner::new(store.clone(), adapters).with_parallel(cfg.fetch.parallel);
    info!(sources = ?runner.source_names(), "sources registered");

    let enricher = DetailEnricher::new(
        Arc::new(ChromeDriver::new(cfg.enrich.headless)),
        Arc::new(LocalAssetStore::new(cfg.screenshot_dir())),
        cfg.enrich.clone(),
    );

    Ok(AppState {
        store,
        runner: Arc::new(runner),
        enricher: Arc::new(enricher),
        scheduler: SchedulerStatus::from_interval(cfg.schedule.interval_secs),
        static_dir: PathBuf::from(&cfg.static_dir),
    })
}
