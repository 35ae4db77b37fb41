// src/ingest/http.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::ingest::types::FeedFetcher;

/// Shared client for feeds and the contents API. `timeout_secs = None` keeps
/// reqwest's default (no overall timeout).
pub fn build_client(user_agent: &str, timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(user_agent.to_string())
        .connect_timeout(Duration::from_secs(10));
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("building http client")
}

pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8",
            )
            .send()
            .await
            .with_context(|| format!("feed http get {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("HTTP {status} when fetching {url}");
        }
        resp.text().await.context("feed http .text()")
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
