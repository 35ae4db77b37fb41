// src/ingest/mod.rs
pub mod feed;
pub mod http;
pub mod indicator;
pub mod types;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;

use crate::config::FeedSourceCfg;
use crate::ingest::types::{FeedEntry, FeedFetcher, NewsItem};
use crate::payload::iso_timestamp;

/// Normalize a headline: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Turn the first `limit` raw entries of one source into news items.
/// Entries without title or link are dropped, later entries do not move up.
pub fn entries_to_news(
    source: &str,
    entries: Vec<FeedEntry>,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<NewsItem> {
    let mut out = Vec::with_capacity(limit.min(entries.len()));
    for entry in entries.into_iter().take(limit) {
        let title = entry.title.as_deref().map(normalize_text).unwrap_or_default();
        let Some(link) = entry.link.filter(|l| !l.is_empty()) else {
            tracing::debug!(source, title = %title, "entry without link skipped");
            continue;
        };
        if title.is_empty() {
            tracing::debug!(source, link = %link, "entry without title skipped");
            continue;
        }
        let published = entry
            .published
            .or(entry.updated)
            .unwrap_or_else(|| iso_timestamp(now));
        out.push(NewsItem {
            source: source.to_string(),
            title,
            link,
            published,
        });
    }
    out
}

async fn collect_source(
    fetcher: &dyn FeedFetcher,
    src: &FeedSourceCfg,
    limit: usize,
) -> Result<Vec<NewsItem>> {
    let body = fetcher.fetch(&src.url).await?;
    let entries =
        feed::parse_feed(&body).with_context(|| format!("parsing feed {}", src.url))?;
    Ok(entries_to_news(&src.display_name(), entries, limit, Utc::now()))
}

/// Fetch every source in table order. A failing source is logged and
/// contributes nothing; the others still run.
pub async fn collect_news(
    fetcher: &dyn FeedFetcher,
    sources: &[FeedSourceCfg],
    per_source: usize,
) -> Vec<NewsItem> {
    crate::metrics::ensure_metrics_described();

    let mut all = Vec::new();
    for src in sources {
        match collect_source(fetcher, src, per_source).await {
            Ok(mut items) => {
                counter!("feed_items_total", "source" => src.key.clone())
                    .increment(items.len() as u64);
                tracing::info!(source = %src.key, items = items.len(), "feed collected");
                all.append(&mut items);
            }
            Err(e) => {
                counter!("feed_source_errors_total", "source" => src.key.clone()).increment(1);
                tracing::warn!(
                    error = ?e,
                    source = %src.key,
                    url = %src.url,
                    fetcher = fetcher.name(),
                    "feed source failed"
                );
            }
        }
    }
    all
}
