// src/pipeline.rs
//! One run: news, then indicator, then a single publish.

use anyhow::Result;
use chrono::Utc;
use metrics::gauge;

use crate::config::PipelineConfig;
use crate::ingest::{
    self,
    http::{build_client, HttpFeedFetcher},
    indicator::IndicatorCollector,
    types::FeedFetcher,
};
use crate::lock::RunLock;
use crate::payload::Payload;
use crate::publish::{github::GitHubContentStore, ContentStore, Destination, PublishOutcome, Publisher};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No credential; nothing was fetched or written.
    MissingCredential,
    /// Another run holds the lock; nothing was fetched or written.
    LockHeld,
    Completed {
        payload: Payload,
        publish: PublishOutcome,
    },
}

pub struct Pipeline {
    config: PipelineConfig,
    credential: Option<String>,
    feeds: Box<dyn FeedFetcher>,
    indicator: IndicatorCollector,
    store: Box<dyn ContentStore>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        credential: Option<String>,
        feeds: Box<dyn FeedFetcher>,
        store: Box<dyn ContentStore>,
    ) -> Result<Self> {
        // The indicator keeps its own per-request timeout.
        let indicator_client = build_client(&config.user_agent, None)?;
        let indicator = IndicatorCollector::new(indicator_client, config.indicator.clone());
        Ok(Self {
            config,
            credential,
            feeds,
            indicator,
            store,
        })
    }

    /// Wire the HTTP implementations.
    pub fn from_config(config: PipelineConfig, credential: Option<String>) -> Result<Self> {
        let client = build_client(&config.user_agent, config.http_timeout_secs)?;
        let feeds = Box::new(HttpFeedFetcher::new(client.clone()));
        let store = Box::new(GitHubContentStore::new(client, &config.publish.api_base));
        Self::new(config, credential, feeds, store)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let Some(credential) = self.credential.clone().filter(|c| !c.trim().is_empty()) else {
            tracing::error!(
                env = %self.config.publish.credential_env,
                "configuration error: publish credential is missing"
            );
            return Ok(RunOutcome::MissingCredential);
        };

        let _lock = match &self.config.run_lock {
            Some(path) => match RunLock::try_acquire(path)? {
                Some(lock) => Some(lock),
                None => {
                    tracing::warn!(path = %path.display(), "another run holds the lock, skipping");
                    return Ok(RunOutcome::LockHeld);
                }
            },
            None => None,
        };

        let run_ts = Utc::now();

        tracing::info!(sources = self.config.sources.len(), "extracting news");
        let news = ingest::collect_news(
            self.feeds.as_ref(),
            &self.config.sources,
            self.config.news_per_source,
        )
        .await;

        tracing::info!(indicator = %self.config.indicator.indicator, "fetching indicator");
        let climate_stats = self.indicator.collect(self.config.climate_stats_limit).await;

        let payload = Payload::new(run_ts, news, climate_stats);
        tracing::info!(
            news = payload.news.len(),
            climate_stats = payload.climate_stats.len(),
            "payload assembled"
        );

        let dest = Destination::from_config(&self.config.publish, credential);
        let publish = Publisher::new(self.store.as_ref(), &self.config.publish.commit_message)
            .publish(&payload, &dest)
            .await;

        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        Ok(RunOutcome::Completed { payload, publish })
    }
}
