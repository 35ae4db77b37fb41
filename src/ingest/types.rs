// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One headline as published in `news[]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub source: String,    // display name, e.g. "AfDB Environment"
    pub title: String,     // normalized text
    pub link: String,
    pub published: String, // as written by the feed, or ISO-8601 "now"
}

/// One non-null indicator observation as published in `climate_stats[]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimateStat {
    pub year: String,
    pub value: f64,
}

/// Raw entry straight out of a feed document, before any fallback is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
}

/// Retrieves the raw body of a feed URL.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}
