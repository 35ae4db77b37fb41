// src/metrics.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::path::Path;

/// One-time metrics registration (so series carry help text in the textfile).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "News items kept per feed source.");
        describe_counter!(
            "feed_source_errors_total",
            "Feed sources that failed to fetch or parse."
        );
        describe_counter!(
            "indicator_records_total",
            "Non-null indicator records kept."
        );
        describe_counter!("indicator_errors_total", "Indicator fetch/parse errors.");
        describe_counter!("publish_total", "Publish attempts by outcome.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last completed a run."
        );
    });
}

/// Prometheus recorder for one process; rendered once at exit.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Write the exposition text for the node-exporter textfile collector.
    /// Goes through a temp file so the collector never reads a partial file.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.handle.render())
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("renaming to {}", path.display()))?;
        Ok(())
    }
}
