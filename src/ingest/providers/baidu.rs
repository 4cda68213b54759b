// src/ingest/providers/baidu.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{lenient_entries, rank_leading, text, value_text, Mode, DEFAULT_LIMIT};
use crate::ingest::types::{SourceAdapter, TrendingItem};

pub const ENDPOINT: &str = "https://top.baidu.com/api/board?platform=wise&tab=realtime";
const REFERER: &str = "https://top.baidu.com/board?tab=realtime";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Data>,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(default)]
    cards: Vec<Card>,
}

#[derive(Debug, Deserialize)]
struct Card {
    #[serde(default)]
    content: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    word: Option<Value>,
    #[serde(default)]
    url: Option<Value>,
    #[serde(default, rename = "hotScore")]
    hot_score: Option<Value>,
}

/// Search-engine hot board: `data.cards[].content[]`, first populated card only.
pub struct BaiduHotSearch {
    mode: Mode,
    limit: usize,
}

impl BaiduHotSearch {
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
        let env: Envelope = serde_json::from_str(s).context("parsing baidu board json")?;
        let first_populated = env
            .data
            .map(|d| d.cards)
            .unwrap_or_default()
            .into_iter()
            .find_map(|c| c.content.filter(|content| !content.is_empty()))
            .unwrap_or_default();
        let entries: Vec<Entry> = lenient_entries(first_populated);

        Ok(rank_leading(
            entries.into_iter().map(|e| TrendingItem {
                title: text(e.word.as_ref()),
                url: text(e.url.as_ref()),
                hot_value: value_text(e.hot_score.as_ref(), ""),
                rank: 0,
            }),
            limit,
        ))
    }
}

#[async_trait]
impl SourceAdapter for BaiduHotSearch {
    async fn fetch_latest(&self) -> Result<Vec<TrendingItem>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body, self.limit)
    }

    fn name(&self) -> &'static str {
        "百度热搜"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_cards_without_content() {
        let raw = r#"{"data":{"cards":[
            {"component":"banner"},
            {"content":[]},
            {"content":[{"word":"first","url":"https://b/1","hotScore":"4961234"}]},
            {"content":[{"word":"ignored"}]}
        ]}}"#;
        let items = BaiduHotSearch::parse_items_from_str(raw, 3).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "first");
        assert_eq!(items[0].url, "https://b/1");
        assert_eq!(items[0].hot_value, "4961234");
    }

    #[test]
    fn mistyped_word_keeps_other_entries() {
        let raw = r#"{"data":{"cards":[{"content":[
            {"word":"ok","url":"https://b/1","hotScore":"1"},
            {"word":{"zh":"x"},"url":null},
            {"word":"also ok","url":["bad"]}
        ]}]}}"#;
        let items = BaiduHotSearch::parse_items_from_str(raw, 3).unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["ok", "also ok"]);
        assert_eq!(items[1].url, "");
    }

    #[test]
    fn numeric_hot_score_is_rendered() {
        let raw = r#"{"data":{"cards":[{"content":[{"word":"n","hotScore":77}]}]}}"#;
        let items = BaiduHotSearch::parse_items_from_str(raw, 3).unwrap();
        assert_eq!(items[0].hot_value, "77");
        assert_eq!(items[0].url, "");
    }
}
