// src/ingest/indicator.rs
//! World Bank indicator slice (CO2 per capita for Sub-Saharan Africa by default).

use anyhow::{anyhow, bail, Context, Result};
use metrics::counter;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::IndicatorCfg;
use crate::ingest::types::ClimateStat;

/// First element of the response array.
#[derive(Debug, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub lastupdated: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IndicatorRecord {
    pub date: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// `[meta, records]`; records is `null` when the page is empty.
#[derive(Debug, Deserialize)]
struct IndicatorResponse(PageMeta, Option<Vec<IndicatorRecord>>);

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    message: Vec<ApiMessage>,
}

pub struct IndicatorCollector {
    client: Client,
    cfg: IndicatorCfg,
}

impl IndicatorCollector {
    pub fn new(client: Client, cfg: IndicatorCfg) -> Self {
        Self { client, cfg }
    }

    /// Never fails: any error is logged and yields an empty list.
    pub async fn collect(&self, limit: usize) -> Vec<ClimateStat> {
        match self.fetch(limit).await {
            Ok(stats) => {
                counter!("indicator_records_total").increment(stats.len() as u64);
                tracing::info!(
                    indicator = %self.cfg.indicator,
                    region = %self.cfg.region,
                    items = stats.len(),
                    "indicator fetched"
                );
                stats
            }
            Err(e) => {
                counter!("indicator_errors_total").increment(1);
                tracing::warn!(
                    error = ?e,
                    indicator = %self.cfg.indicator,
                    "indicator fetch failed"
                );
                Vec::new()
            }
        }
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<ClimateStat>> {
        let url = self.cfg.endpoint();
        let per_page = self.cfg.per_page.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("per_page", per_page.as_str())])
            .timeout(Duration::from_secs(self.cfg.timeout_secs))
            .send()
            .await
            .with_context(|| format!("indicator http get {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("HTTP {status} from {url}");
        }
        let body = resp.text().await.context("indicator http .text()")?;
        parse_indicator_response(&body, limit)
    }
}

/// Validate the `[meta, records]` shape, drop null values, keep upstream
/// order (most recent first) and cut at `limit`.
pub fn parse_indicator_response(body: &str, limit: usize) -> Result<Vec<ClimateStat>> {
    let raw: serde_json::Value =
        serde_json::from_str(body).context("indicator response is not json")?;
    let arr = raw
        .as_array()
        .ok_or_else(|| anyhow!("indicator response is not a top-level array"))?;

    if arr.len() == 1 {
        if let Ok(env) = ApiErrorEnvelope::deserialize(&arr[0]) {
            let msg = env
                .message
                .iter()
                .map(|m| {
                    format!(
                        "{} {}: {}",
                        m.id.as_deref().unwrap_or("?"),
                        m.key.as_deref().unwrap_or_default(),
                        m.value.as_deref().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            bail!("indicator api error: {msg}");
        }
    }

    let IndicatorResponse(meta, records) = IndicatorResponse::deserialize(&raw)
        .context("unexpected indicator response shape, want [meta, records]")?;
    let records = records.unwrap_or_default();
    tracing::debug!(
        page = ?meta.page,
        total = ?meta.total,
        last_updated = ?meta.lastupdated,
        records = records.len(),
        "indicator page"
    );

    Ok(records
        .into_iter()
        .filter_map(|r| r.value.map(|value| ClimateStat { year: r.date, value }))
        .take(limit)
        .collect())
}
