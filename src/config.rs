// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

/// Upper bounds on what one published document may carry.
pub const MAX_NEWS_PER_SOURCE: usize = 5;
pub const MAX_CLIMATE_STATS: usize = 5;

fn default_news_per_source() -> usize {
    MAX_NEWS_PER_SOURCE
}
fn default_climate_stats_limit() -> usize {
    MAX_CLIMATE_STATS
}
fn default_user_agent() -> String {
    format!("africa-green-data/{}", env!("CARGO_PKG_VERSION"))
}

/// One named feed. `key` is the stable identifier, the display name is what
/// ends up in `news[].source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSourceCfg {
    pub key: String,
    pub url: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl FeedSourceCfg {
    pub fn new(key: &str, url: &str) -> Self {
        Self {
            key: key.to_string(),
            url: url.to_string(),
            display_name: None,
        }
    }

    /// "AfDB_Environment" -> "AfDB Environment" unless overridden.
    pub fn display_name(&self) -> String {
        match &self.display_name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => self.key.replace('_', " "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorCfg {
    pub base_url: String,
    pub region: String,
    pub indicator: String,
    pub per_page: u32,
    pub timeout_secs: u64,
}

impl Default for IndicatorCfg {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldbank.org/v2".to_string(),
            region: "SSF".to_string(),
            indicator: "EN.ATM.CO2E.PC".to_string(),
            per_page: 10,
            timeout_secs: 10,
        }
    }
}

impl IndicatorCfg {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/region/{}/indicator/{}",
            self.base_url.trim_end_matches('/'),
            self.region,
            self.indicator
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishCfg {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
    /// Name of the environment variable holding the token, not the token itself.
    pub credential_env: String,
    pub commit_message: String,
}

impl Default for PublishCfg {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            owner: "africa-green-data".to_string(),
            repo: "africa-green-data".to_string(),
            path: "africa_green_data.json".to_string(),
            branch: "main".to_string(),
            credential_env: "MY_GITHUB_TOKEN".to_string(),
            commit_message: "Update Africa Green News".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: Vec<FeedSourceCfg>,
    #[serde(default = "default_news_per_source")]
    pub news_per_source: usize,
    #[serde(default = "default_climate_stats_limit")]
    pub climate_stats_limit: usize,
    /// Applies to feed fetches and contents API calls; `None` keeps reqwest's default.
    pub http_timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub indicator: IndicatorCfg,
    pub publish: PublishCfg,
    pub run_lock: Option<PathBuf>,
    pub metrics_textfile: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                FeedSourceCfg::new(
                    "AfDB_Environment",
                    "https://www.afdb.org/fr/topics/environment/rss.xml",
                ),
                FeedSourceCfg::new("UNECA_News", "https://archive.uneca.org/fr/rss-feeds"),
                FeedSourceCfg::new(
                    "Sustainability_Africa",
                    "https://www.sustainabilitynewsafrica.com/feed/",
                ),
                FeedSourceCfg::new(
                    "Green_Economy_Africa",
                    "https://www.unep.org/news-and-stories/rss.xml",
                ),
            ],
            news_per_source: default_news_per_source(),
            climate_stats_limit: default_climate_stats_limit(),
            http_timeout_secs: None,
            user_agent: default_user_agent(),
            indicator: IndicatorCfg::default(),
            publish: PublishCfg::default(),
            run_lock: None,
            metrics_textfile: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_NEWS_PER_SOURCE).contains(&self.news_per_source) {
            bail!("news_per_source must be between 1 and {MAX_NEWS_PER_SOURCE}");
        }
        if !(1..=MAX_CLIMATE_STATS).contains(&self.climate_stats_limit) {
            bail!("climate_stats_limit must be between 1 and {MAX_CLIMATE_STATS}");
        }
        for (name, v) in [
            ("publish.owner", &self.publish.owner),
            ("publish.repo", &self.publish.repo),
            ("publish.path", &self.publish.path),
            ("publish.branch", &self.publish.branch),
            ("publish.credential_env", &self.publish.credential_env),
        ] {
            if v.trim().is_empty() {
                bail!("{name} must not be empty");
            }
        }
        for s in &self.sources {
            if s.key.trim().is_empty() || s.url.trim().is_empty() {
                bail!("feed source entries need both key and url");
            }
        }
        Ok(())
    }
}

/// Load config from an explicit TOML file.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config from {}", path.display()))?;
    let cfg: PipelineConfig = toml::from_str(&content)
        .with_context(|| format!("parsing pipeline config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validating pipeline config {}", path.display()))?;
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $PIPELINE_CONFIG_PATH
/// 2) config/pipeline.toml
/// 3) built-in defaults
pub fn load_config_default() -> Result<PipelineConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if p.exists() {
        return load_config_from(&p);
    }
    Ok(PipelineConfig::default())
}

/// Read the publish credential from the env var named in the config.
/// Blank values count as missing.
pub fn read_credential(cfg: &PipelineConfig) -> Option<String> {
    std::env::var(&cfg.publish.credential_env)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
