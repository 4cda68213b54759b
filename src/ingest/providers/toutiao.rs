// src/ingest/providers/toutiao.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{lenient_entries, rank_leading, text, value_text, Mode, DEFAULT_LIMIT};
use crate::ingest::types::{SourceAdapter, TrendingItem};

pub const ENDPOINT: &str = "https://www.toutiao.com/hot-event/hot-board/?origin=toutiao_pc";
const REFERER: &str = "https://www.toutiao.com/";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<Value>,
}

// The board mixes `Title`/`title` style keys; the capitalized form wins when present.
#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default, rename = "Title")]
    title_upper: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
    #[serde(default, rename = "Url")]
    url_upper: Option<Value>,
    #[serde(default)]
    url: Option<Value>,
    #[serde(default, rename = "HotValue")]
    hot_value_upper: Option<Value>,
    #[serde(default)]
    hot_value: Option<Value>,
}

/// News-aggregator hot board: `data[]`.
pub struct ToutiaoHotBoard {
    mode: Mode,
    limit: usize,
}

impl ToutiaoHotBoard {
    pub fn live(client: reqwest::Client) -> Self {
        Self::from_url(ENDPOINT, client)
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::http(url, REFERER, client),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn parse_items_from_str(s: &str, limit: usize) -> Result<Vec<TrendingItem>> {
        let env: Envelope = serde_json::from_str(s).context("parsing toutiao hot board json")?;

        let entries: Vec<Entry> = lenient_entries(env.data);

        Ok(rank_leading(
            entries.into_iter().map(|e| {
                let hot = e.hot_value_upper.or(e.hot_value);
                TrendingItem {
                    title: text(e.title_upper.or(e.title).as_ref()),
                    url: text(e.url_upper.or(e.url).as_ref()),
                    hot_value: value_text(hot.as_ref(), "0"),
                    rank: 0,
                }
            }),
            limit,
        ))
    }
}

#[async_trait]
impl SourceAdapter for ToutiaoHotBoard {
    async fn fetch_latest(&self) -> Result<Vec<TrendingItem>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body, self.limit)
    }

    fn name(&self) -> &'static str {
        "今日头条"
    }
}
