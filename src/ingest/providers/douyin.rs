// src/ingest/providers/douyin.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{lenient_entries, rank_leading, text, value_text, Mode, DEFAULT_LIMIT};
use crate::ingest::types::{SourceAdapter, TrendingItem};

pub const ENDPOINT: &str = "https://www.iesdouyin.com/web/api/v2/hotsearch/billboard/word/";
const REFERER: &str = "https://www.douyin.com/";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    word_list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    word: Option<Value>,
    #[serde(default)]
    hot_value: Option<Value>,
}

/// Short-video hot search: flat `word_list[]`.
pub struct DouyinHotSearch {
    mode: Mode,
    limit: usize,
}

impl DouyinHotSearch {
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
        let env: Envelope = serde_json::from_str(s).context("parsing douyin billboard json")?;

        let entries: Vec<Entry> = lenient_entries(env.word_list);

        Ok(rank_leading(
            entries.into_iter().map(|e| {
                let word = text(e.word.as_ref());
                TrendingItem {
                    url: format!("https://www.douyin.com/search/{}", urlencoding::encode(&word)),
                    title: word,
                    hot_value: value_text(e.hot_value.as_ref(), "0"),
                    rank: 0,
                }
            }),
            limit,
        ))
    }
}

#[async_trait]
impl SourceAdapter for DouyinHotSearch {
    async fn fetch_latest(&self) -> Result<Vec<TrendingItem>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body, self.limit)
    }

    fn name(&self) -> &'static str {
        "抖音热搜"
    }
}
