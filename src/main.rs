//! Africa Green Data: one aggregation run per invocation.
//! Meant to be triggered by cron or a CI schedule; see `config/pipeline.toml`.

use africa_green_data::{config, metrics::Metrics, Pipeline, RunOutcome};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact human logs by default, JSON lines with PIPELINE_LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("PIPELINE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local runs; no-op in CI where secrets come from the environment.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_config_default()?;

    let metrics = match &cfg.metrics_textfile {
        Some(_) => Some(Metrics::install()?),
        None => None,
    };

    let credential = config::read_credential(&cfg);
    let pipeline = Pipeline::from_config(cfg, credential)?;

    match pipeline.run().await {
        Ok(RunOutcome::Completed { payload, publish }) => tracing::info!(
            news = payload.news.len(),
            climate_stats = payload.climate_stats.len(),
            success = publish.is_success(),
            "run finished"
        ),
        Ok(RunOutcome::MissingCredential) => {
            tracing::info!("run aborted before any network call")
        }
        Ok(RunOutcome::LockHeld) => tracing::info!("run skipped"),
        Err(e) => tracing::error!(error = ?e, "run failed"),
    }

    if let (Some(m), Some(path)) = (&metrics, &pipeline.config().metrics_textfile) {
        if let Err(e) = m.write_textfile(path) {
            tracing::warn!(error = ?e, "could not write metrics textfile");
        }
    }

    Ok(())
}
