// src/ingest/providers/zhihu.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{lenient_entries, rank_leading, text, Mode, DEFAULT_LIMIT};
use crate::ingest::types::{SourceAdapter, TrendingItem};

pub const ENDPOINT: &str = "https://www.zhihu.com/api/v3/feed/topstory/hot-lists/total?limit=50";
const REFERER: &str = "https://www.zhihu.com/hot";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    target: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Target {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    url: Option<Value>,
    #[serde(default)]
    detail_text: Option<Value>,
}

/// API links point at `api/v4/questions/<id>`; the readable page is `question/<id>`.
fn public_question_url(api_url: &str) -> String {
    api_url.replace("api/v4/questions", "question")
}

/// Q&A hot list: `data[].target`.
pub struct ZhihuHotList {
    mode: Mode,
    limit: usize,
}

impl ZhihuHotList {
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
        let env: Envelope = serde_json::from_str(s).context("parsing zhihu hot list json")?;

        let entries: Vec<Entry> = lenient_entries(env.data);

        Ok(rank_leading(
            entries.into_iter().map(|e| {
                // a target that is not an object reads as an empty one
                let t: Target = e
                    .target
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default();
                TrendingItem {
                    title: text(t.title.as_ref()),
                    url: public_question_url(&text(t.url.as_ref())),
                    hot_value: text(t.detail_text.as_ref()),
                    rank: 0,
                }
            }),
            limit,
        ))
    }
}

#[async_trait]
impl SourceAdapter for ZhihuHotList {
    async fn fetch_latest(&self) -> Result<Vec<TrendingItem>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body, self.limit)
    }

    fn name(&self) -> &'static str {
        "知乎热榜"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_api_question_links() {
        assert_eq!(
            public_question_url("https://api.zhihu.com/api/v4/questions/42"),
            "https://api.zhihu.com/question/42"
        );
        assert_eq!(public_question_url(""), "");
    }

    #[test]
    fn mistyped_target_fields_keep_the_rest() {
        let raw = r#"{"data":[
            {"target":{"title":"First","url":"api/v4/questions/1","detail_text":"9 万热度"}},
            {"target":{"title":["oops"],"url":7}},
            {"target":"gone"},
            {"target":{"title":"Fourth","detail_text":12}}
        ]}"#;
        let items = ZhihuHotList::parse_items_from_str(raw, 4).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First");
        assert_eq!(items[0].url, "question/1");
        assert_eq!(items[1].title, "Fourth");
        assert_eq!(items[1].hot_value, "12");
        assert_eq!(items[1].rank, 2);
    }

    #[test]
    fn entry_without_target_is_dropped() {
        let raw = r#"{"data":[{"id":"x"},{"target":{"title":"Kept"}}]}"#;
        let items = ZhihuHotList::parse_items_from_str(raw, 3).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Kept");
        assert_eq!(items[0].rank, 1);
        assert_eq!(items[0].hot_value, "");
    }
}
