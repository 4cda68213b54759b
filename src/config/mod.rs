// src/config/mod.rs
pub mod crawler;

pub use crawler::{CrawlerConfig, EnrichConfig, FetchConfig, ScheduleConfig};
