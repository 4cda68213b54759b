// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::ingest::AggregationRunner;

#[derive(Clone, Copy, Debug)]
pub struct CrawlSchedulerCfg {
    pub interval_secs: u64,
}

/// What `/scheduler/status` reports.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub status: &'static str,
    pub interval_secs: Option<u64>,
    pub description: &'static str,
}

impl SchedulerStatus {
    pub fn from_interval(interval_secs: u64) -> Self {
        if interval_secs == 0 {
            Self {
                status: "manual_only",
                interval_secs: None,
                description: "crawls run only when POST /crawl is called",
            }
        } else {
            Self {
                status: "interval",
                interval_secs: Some(interval_secs),
                description: "crawls run periodically and on POST /crawl",
            }
        }
    }
}

/// Periodic trigger for `run_once`. The first tick fires immediately.
/// Returns `None` when the interval is 0 (manual-only mode).
pub fn spawn_scheduler(
    runner: Arc<AggregationRunner>,
    cfg: CrawlSchedulerCfg,
) -> Option<JoinHandle<()>> {
    if cfg.interval_secs == 0 {
        tracing::info!(target: "crawl", "scheduler disabled; manual crawls only");
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match runner.run_once().await {
                Ok(summary) => tracing::info!(
                    target: "crawl",
                    total = summary.total_persisted,
                    "scheduled crawl tick"
                ),
                Err(e) => tracing::error!(target: "crawl", error = ?e, "scheduled crawl failed"),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_means_manual_only() {
        let s = SchedulerStatus::from_interval(0);
        assert_eq!(s.status, "manual_only");
        assert_eq!(s.interval_secs, None);
        let s = SchedulerStatus::from_interval(1800);
        assert_eq!(s.status, "interval");
        assert_eq!(s.interval_secs, Some(1800));
    }
}
