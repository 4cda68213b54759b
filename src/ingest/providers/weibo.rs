// src/ingest/providers/weibo.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{lenient_entries, rank_leading, text, value_text, Mode, DEFAULT_LIMIT};
use crate::ingest::types::{SourceAdapter, TrendingItem};

pub const ENDPOINT: &str = "https://weibo.com/ajax/side/hotSearch";
const REFERER: &str = "https://weibo.com";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Data>,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(default)]
    realtime: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    note: Option<Value>,
    #[serde(default)]
    word: Option<Value>,
    #[serde(default)]
    num: Option<Value>,
}

/// Microblog hot search: `data.realtime[]`.
pub struct WeiboHotSearch {
    mode: Mode,
    limit: usize,
}

impl WeiboHotSearch {
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
        let env: Envelope = serde_json::from_str(s).context("parsing weibo hot search json")?;
        let entries: Vec<Entry> =
            lenient_entries(env.data.map(|d| d.realtime).unwrap_or_default());

        Ok(rank_leading(
            entries.into_iter().map(|e| {
                let word = text(e.word.as_ref());
                let note = text(e.note.as_ref());
                TrendingItem {
                    title: if note.is_empty() { word.clone() } else { note },
                    url: format!(
                        "https://s.weibo.com/weibo?q=%23{}%23",
                        urlencoding::encode(&word)
                    ),
                    hot_value: value_text(e.num.as_ref(), "0"),
                    rank: 0,
                }
            }),
            limit,
        ))
    }
}

#[async_trait]
impl SourceAdapter for WeiboHotSearch {
    async fn fetch_latest(&self) -> Result<Vec<TrendingItem>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body, self.limit)
    }

    fn name(&self) -> &'static str {
        "微博热搜"
    }
}
