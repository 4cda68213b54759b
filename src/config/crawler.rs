// src/config/crawler.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "CRAWLER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/crawler.toml";

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";
pub const ENV_CRAWL_INTERVAL_SECS: &str = "CRAWL_INTERVAL_SECS";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_database_url() -> String {
    "sqlite:hotspots.db?mode=rwc".to_string()
}
fn default_static_dir() -> String {
    "static".to_string()
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_items_per_source() -> usize {
    3
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_navigation_timeout_secs() -> u64 {
    30
}
fn default_settle_delay_ms() -> u64 {
    2000
}
fn default_content_max_chars() -> usize {
    5000
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Root served under `/static`; screenshots land in `<static_dir>/screenshots`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub enrich: EnrichConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Hot-list requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    /// Leading items kept per source.
    #[serde(default = "default_items_per_source")]
    pub items_per_source: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Run all sources concurrently instead of one after another.
    #[serde(default)]
    pub parallel: bool,
}

/// Browser-driven detail capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// Fixed wait after the page has loaded, for client-rendered content.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_content_max_chars")]
    pub content_max_chars: usize,
    #[serde(default = "default_true")]
    pub headless: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 0 keeps the crawler in manual-only mode.
    #[serde(default)]
    pub interval_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            static_dir: default_static_dir(),
            fetch: FetchConfig::default(),
            enrich: EnrichConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            items_per_source: default_items_per_source(),
            user_agent: default_user_agent(),
            parallel: false,
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: default_navigation_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            content_max_chars: default_content_max_chars(),
            headless: true,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EnrichConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl CrawlerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading crawler config from {}", path.display()))?;
        let cfg: CrawlerConfig = toml::from_str(&data)
            .with_context(|| format!("parsing crawler config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolution order:
    /// 1) $CRAWLER_CONFIG_PATH
    /// 2) config/crawler.toml
    /// 3) built-in defaults
    ///
    /// Env overrides (`DATABASE_URL`, `STATIC_DIR`, `CRAWL_INTERVAL_SECS`) apply on top.
    pub fn load_default() -> Result<Self> {
        let cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("CRAWLER_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from_file(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(ENV_DATABASE_URL) {
            if !url.trim().is_empty() {
                self.database_url = url.trim().to_string();
            }
        }
        if let Ok(dir) = std::env::var(ENV_STATIC_DIR) {
            if !dir.trim().is_empty() {
                self.static_dir = dir.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var(ENV_CRAWL_INTERVAL_SECS) {
            self.schedule.interval_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CRAWL_INTERVAL_SECS} must be an integer"))?;
        }
        Ok(self)
    }

    /// Zero limits and timeouts would silently disable a stage, so they fall back to defaults.
    fn sanitized(mut self) -> Self {
        if self.fetch.timeout_secs == 0 {
            self.fetch.timeout_secs = default_fetch_timeout_secs();
        }
        if self.fetch.items_per_source == 0 {
            self.fetch.items_per_source = default_items_per_source();
        }
        if self.fetch.user_agent.trim().is_empty() {
            self.fetch.user_agent = default_user_agent();
        }
        if self.enrich.navigation_timeout_secs == 0 {
            self.enrich.navigation_timeout_secs = default_navigation_timeout_secs();
        }
        if self.enrich.content_max_chars == 0 {
            self.enrich.content_max_chars = default_content_max_chars();
        }
        self
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        Path::new(&self.static_dir).join("screenshots")
    }
}
