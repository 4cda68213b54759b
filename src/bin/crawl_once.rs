//! One crawl against the configured database, then exit (cron-friendly).

use hotspot_crawler::config::CrawlerConfig;
use hotspot_crawler::ingest::{providers, AggregationRunner, SourceOutcome};
use hotspot_crawler::store::SqliteStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cfg = CrawlerConfig::load_default()?;
    let store = Arc::new(SqliteStore::connect(&cfg.database_url).await?);
    let runner = AggregationRunner::new(store, providers::default_registry(&cfg.fetch)?)
        .with_parallel(cfg.fetch.parallel);

    let summary = runner.run_once().await?;
    for report in &summary.sources {
        match &report.outcome {
            SourceOutcome::Fetched { items } => println!("{:<8} {items} items", report.source),
            SourceOutcome::Empty => println!("{:<8} no data", report.source),
            SourceOutcome::Failed { error } => println!("{:<8} failed: {error}", report.source),
        }
    }
    println!("total: {}", summary.total_persisted);
    Ok(())
}
