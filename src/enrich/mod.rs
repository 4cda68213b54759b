// src/enrich/mod.rs
//! On-demand detail capture for a single hotspot.
//!
//! Each call owns a fresh browser session: launch, navigate and wait for network
//! idle (one shared budget), settle, read the title, take a full-page screenshot,
//! extract the visible text, store the screenshot, close.
//! Failures never escape `enrich`; they come back as a degraded result so the
//! record can still be updated and retried later.

pub mod assets;
pub mod browser;

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EnrichConfig;
use crate::store::{HotspotRecord, HotspotStore};
use assets::AssetStore;
use browser::{BrowserDriver, BrowserSession};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const TRUNCATION_MARKER: &str = "\n\n... (content truncated)";
pub const ERROR_PREFIX: &str = "Error fetching details: ";
pub const FAILED_SUMMARY: &str = "Failed to generate summary.";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("enrich_requests_total", "Detail enrichment calls.");
        describe_counter!(
            "enrich_failures_total",
            "Enrichment calls that produced a degraded result."
        );
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentResult {
    pub content: String,
    pub screenshot_path: Option<String>,
    pub summary: String,
}

impl EnrichmentResult {
    pub fn failed(cause: &anyhow::Error) -> Self {
        Self {
            content: format!("{ERROR_PREFIX}{cause:#}"),
            screenshot_path: None,
            summary: FAILED_SUMMARY.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.screenshot_path.is_none() && self.content.starts_with(ERROR_PREFIX)
    }
}

/// Produces the short text stored in `summary`.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, title: &str, content: &str) -> String;
}

/// Stand-in until real content understanding exists: echoes the start of the title.
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleSummarizer;

impl Summarizer for TitleSummarizer {
    fn summarize(&self, title: &str, _content: &str) -> String {
        let head: String = title.chars().take(100).collect();
        format!("Screenshot captured. Article: {head}...")
    }
}

/// Trim every line, drop blank ones, cap at `max_chars` characters.
pub fn clean_content(raw: &str, max_chars: usize) -> String {
    let cleaned = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let mut out: String = cleaned.chars().take(max_chars).collect();
    out.truncate(out.trim_end().len());
    out.push_str(TRUNCATION_MARKER);
    out
}

struct CapturedPage {
    title: String,
    screenshot_path: String,
    content: String,
}

pub struct DetailEnricher {
    driver: Arc<dyn BrowserDriver>,
    assets: Arc<dyn AssetStore>,
    summarizer: Arc<dyn Summarizer>,
    cfg: EnrichConfig,
}

impl DetailEnricher {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        assets: Arc<dyn AssetStore>,
        cfg: EnrichConfig,
    ) -> Self {
        Self {
            driver,
            assets,
            summarizer: Arc::new(TitleSummarizer),
            cfg,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Always returns a result; check `is_failure` to tell a degraded one apart.
    pub async fn enrich(&self, url: &str) -> EnrichmentResult {
        ensure_metrics_described();
        counter!("enrich_requests_total").increment(1);

        match self.try_enrich(url).await {
            Ok(result) => {
                info!(%url, "enrichment captured");
                result
            }
            Err(e) => {
                counter!("enrich_failures_total").increment(1);
                warn!(%url, error = ?e, "enrichment failed");
                EnrichmentResult::failed(&e)
            }
        }
    }

    async fn try_enrich(&self, url: &str) -> Result<EnrichmentResult> {
        if url.trim().is_empty() {
            bail!("hotspot has no url to open");
        }

        let mut session = self.driver.launch().await.context("launching browser")?;
        let captured = self.capture(&mut *session, url).await;
        // Single release point for every outcome of the capture sequence.
        if let Err(e) = session.close().await {
            warn!(error = ?e, "browser close failed");
        }
        let page = captured?;

        let summary = self.summarizer.summarize(&page.title, &page.content);
        Ok(EnrichmentResult {
            content: page.content,
            screenshot_path: Some(page.screenshot_path),
            summary,
        })
    }

    async fn capture(&self, session: &mut dyn BrowserSession, url: &str) -> Result<CapturedPage> {
        let budget = self.cfg.navigation_timeout();
        tokio::time::timeout(budget, async {
            session.navigate(url).await?;
            session.wait_for_network_idle().await
        })
        .await
        .map_err(|_| anyhow!("navigation to {url} timed out after {}s", budget.as_secs()))??;

        let settle = self.cfg.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        // Best effort, read before anything else touches the page.
        let title = match session.title().await {
            Ok(Some(t)) if !t.trim().is_empty() => t,
            Ok(_) => UNKNOWN_TITLE.to_string(),
            Err(e) => {
                debug!(error = ?e, "title unavailable");
                UNKNOWN_TITLE.to_string()
            }
        };

        let png = session.screenshot_full_page().await?;
        let raw = session.inner_text().await?;
        let content = clean_content(&raw, self.cfg.content_max_chars);

        // Written last: a failed capture leaves no file behind.
        let screenshot_path = self.assets.write_screenshot(&png).await?;

        Ok(CapturedPage {
            title,
            screenshot_path,
            content,
        })
    }
}

/// Enrich the stored hotspot `id` and write the result back onto that row.
/// `Ok(None)` when no such hotspot exists.
pub async fn enrich_hotspot(
    store: &dyn HotspotStore,
    enricher: &DetailEnricher,
    id: i64,
) -> Result<Option<HotspotRecord>> {
    let Some(record) = store.get(id).await? else {
        return Ok(None);
    };

    let result = enricher.enrich(&record.url).await;
    let updated = store
        .update_enrichment(
            id,
            &result.content,
            result.screenshot_path.as_deref(),
            &result.summary,
        )
        .await?;
    if !updated {
        // deleted while the browser was running
        return Ok(None);
    }
    store.get(id).await
}
