// tests/metrics_textfile.rs
// Own test binary: the Prometheus recorder is process-global.
mod common;

use africa_green_data::config::FeedSourceCfg;
use africa_green_data::ingest::collect_news;
use africa_green_data::metrics::Metrics;
use common::{fixture, ScriptedFeeds};

#[tokio::test]
async fn feed_series_end_up_in_the_textfile() {
    let metrics = Metrics::install().expect("recorder");

    let ok = "https://feeds.test/ok.xml";
    let feeds = ScriptedFeeds::new(&[(ok, fixture("rss_three.xml"))]);
    let sources = vec![
        FeedSourceCfg::new("AfDB_Environment", ok),
        FeedSourceCfg::new("UNECA_News", "https://feeds.test/down.xml"),
    ];
    let news = collect_news(&feeds, &sources, 5).await;
    assert_eq!(news.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("africa_green_data.prom");
    metrics.write_textfile(&path).unwrap();

    let out = std::fs::read_to_string(&path).unwrap();
    assert!(out.contains("feed_items_total{source=\"AfDB_Environment\"} 3"));
    assert!(out.contains("feed_source_errors_total{source=\"UNECA_News\"} 1"));
    assert!(!dir.path().join("africa_green_data.prom.tmp").exists());
}
