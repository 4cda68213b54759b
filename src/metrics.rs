// src/metrics.rs
use anyhow::{Context, Result};
use axum::{http::header, routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::config::CrawlerConfig;

// Hot-list endpoints usually answer within a second; browser captures take far longer.
const FETCH_MS_BUCKETS: &[f64] = &[
    50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0,
];

/// Prometheus exposition for the crawl and enrichment series.
#[derive(Clone)]
pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide recorder and publish the configured limits as gauges.
    /// Errors when another recorder is already installed.
    pub fn install(cfg: &CrawlerConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full("crawl_fetch_ms".to_string()), FETCH_MS_BUCKETS)
            .context("prometheus: fetch histogram buckets")?
            .install_recorder()
            .context("prometheus: install recorder")?;

        gauge!("crawl_items_per_source").set(cfg.fetch.items_per_source as f64);
        gauge!("crawl_schedule_interval_secs").set(cfg.schedule.interval_secs as f64);
        gauge!("enrich_navigation_timeout_secs").set(cfg.enrich.navigation_timeout_secs as f64);

        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `/metrics`, mergeable into any app router regardless of its state type.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let this = self.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let body = this.render();
                async move { ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body) }
            }),
        )
    }
}
