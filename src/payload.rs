// src/payload.rs
//! The document published on every run. Field order here is the field order
//! in the file.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::{ClimateStat, NewsItem};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    pub last_update: String,
    pub news: Vec<NewsItem>,
    pub climate_stats: Vec<ClimateStat>,
}

impl Payload {
    pub fn new(run_ts: DateTime<Utc>, news: Vec<NewsItem>, climate_stats: Vec<ClimateStat>) -> Self {
        Self {
            last_update: iso_timestamp(run_ts),
            news,
            climate_stats,
        }
    }

    /// Pretty JSON, 4-space indent, non-ASCII left as UTF-8.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut buf = Vec::with_capacity(1024);
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.serialize(&mut ser).context("serializing payload")?;
        String::from_utf8(buf).context("payload json is not utf-8")
    }

    /// Base64 of the pretty JSON, as the contents API wants it.
    pub fn encode_content(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_json_pretty()?.as_bytes()))
    }

    pub fn decode_content(content: &str) -> Result<Self> {
        // GitHub wraps base64 at 60 columns in GET responses.
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let raw = STANDARD.decode(compact).context("decoding base64 content")?;
        serde_json::from_slice(&raw).context("parsing payload json")
    }
}

/// `2024-05-01T08:30:00Z`
pub fn iso_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
