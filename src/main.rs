//! Hotspot crawler service: binary entrypoint.
//! Boots the Axum HTTP server, wiring the store, sources, enricher and scheduler.

use hotspot_crawler::config::CrawlerConfig;
use hotspot_crawler::ingest::scheduler::{spawn_scheduler, CrawlSchedulerCfg};
use hotspot_crawler::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hotspot_crawler=info,warn"));

    // Shuttle may already have installed a subscriber; that one wins.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = CrawlerConfig::load_default()?;
    tracing::info!(
        database_url = %cfg.database_url,
        static_dir = %cfg.static_dir,
        interval_secs = cfg.schedule.interval_secs,
        "crawler config loaded"
    );

    let state = hotspot_crawler::build_state(&cfg).await?;

    spawn_scheduler(
        state.runner.clone(),
        CrawlSchedulerCfg {
            interval_secs: cfg.schedule.interval_secs,
        },
    );

    let mut router = hotspot_crawler::create_router(state);
    match Metrics::install(&cfg) {
        Ok(metrics) => router = router.merge(metrics.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
