// src/ingest/providers/mod.rs
//! Hot-list adapters, one per platform.
//!
//! Every adapter can run against its live endpoint or over a captured response body
//! (`from_fixture_str`), and both modes go through the same parser.

pub mod baidu;
pub mod douyin;
pub mod toutiao;
pub mod weibo;
pub mod zhihu;

use anyhow::{bail, Context, Result};
use metrics::histogram;
use reqwest::header::REFERER;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::FetchConfig;
use crate::ingest::types::{SourceAdapter, TrendingItem};

pub use baidu::BaiduHotSearch;
pub use douyin::DouyinHotSearch;
pub use toutiao::ToutiaoHotBoard;
pub use weibo::WeiboHotSearch;
pub use zhihu::ZhihuHotList;

pub const DEFAULT_LIMIT: usize = 3;

/// Where an adapter reads its response body from.
pub(crate) enum Mode {
    Fixture(String),
    Http {
        url: String,
        referer: &'static str,
        client: reqwest::Client,
    },
}

impl Mode {
    pub(crate) fn http(url: impl Into<String>, referer: &'static str, client: reqwest::Client) -> Self {
        Mode::Http {
            url: url.into(),
            referer,
            client,
        }
    }

    /// One GET with the platform's `Referer`. Non-2xx is an error, not an empty body.
    pub(crate) async fn body(&self, source: &'static str) -> Result<String> {
        match self {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http {
                url,
                referer,
                client,
            } => {
                let t0 = std::time::Instant::now();
                let resp = client
                    .get(url.as_str())
                    .header(REFERER, *referer)
                    .send()
                    .await
                    .with_context(|| format!("{source} http get()"))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("{source} responded with HTTP {status}");
                }
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("{source} http .text()"))?;
                let ms = t0.elapsed().as_secs_f64() * 1_000.0;
                histogram!("crawl_fetch_ms", "source" => source).record(ms);
                Ok(body)
            }
        }
    }
}

/// Shared client for the hot-list endpoints: browser user agent and the fetch timeout.
pub fn build_client(cfg: &FetchConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(cfg.user_agent.clone())
        .timeout(cfg.timeout())
        .build()
        .context("building hot-list http client")
}

/// All five platforms against their live endpoints, in crawl order.
pub fn default_registry(cfg: &FetchConfig) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let client = build_client(cfg)?;
    let limit = cfg.items_per_source;
    Ok(vec![
        Box::new(WeiboHotSearch::live(client.clone()).with_limit(limit)),
        Box::new(ZhihuHotList::live(client.clone()).with_limit(limit)),
        Box::new(BaiduHotSearch::live(client.clone()).with_limit(limit)),
        Box::new(DouyinHotSearch::live(client.clone()).with_limit(limit)),
        Box::new(ToutiaoHotBoard::live(client).with_limit(limit)),
    ])
}

/// Keep the leading `limit` entries, drop untitled ones, number the rest from 1.
pub(crate) fn rank_leading(
    entries: impl IntoIterator<Item = TrendingItem>,
    limit: usize,
) -> Vec<TrendingItem> {
    entries
        .into_iter()
        .take(limit)
        .filter_map(|mut it| {
            it.title = it.title.trim().to_string();
            (!it.title.is_empty()).then_some(it)
        })
        .enumerate()
        .map(|(i, mut it)| {
            it.rank = i as u32 + 1;
            it
        })
        .collect()
}

/// Render a loosely typed JSON scalar as text; absent values become `fallback`.
pub(crate) fn value_text(v: Option<&Value>, fallback: &str) -> String {
    match v {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Text field that tolerates the wrong JSON type: strings as-is, numbers rendered,
/// anything else (objects, arrays, bools, null) becomes empty.
pub(crate) fn text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Decode list entries one by one; an entry that does not fit `T` is skipped
/// instead of failing the whole list.
pub(crate) fn lenient_entries<T: DeserializeOwned>(raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed hot-list entry");
                None
            }
        })
        .collect()
}
