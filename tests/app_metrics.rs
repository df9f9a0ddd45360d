// tests/app_metrics.rs
//
// The full application on a multi-threaded runtime: the mount refresh fires
// as soon as the scheduler starts, and its series (with HELP text) must land
// in the Prometheus recorder. Own test binary, since the recorder is global.

use std::time::Duration;

use axum::{
    body::{self, Body},
    http::Request,
    Router,
};
use tower::ServiceExt as _;

use market_tracker::app_with_config;
use market_tracker::config::TrackerConfig;

async fn render_metrics(app: &Router) -> String {
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .expect("build GET /metrics");
    let resp = app.clone().oneshot(req).await.expect("oneshot /metrics");
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mount_cycle_is_recorded_with_descriptions() {
    let mut cfg = TrackerConfig::default();
    // nothing listens here, so the mount cycle falls back to demo data
    cfg.quotes.proxy_base_url = "http://127.0.0.1:9".into();
    cfg.quotes.timeout_secs = 2;
    cfg.news.enabled = false;

    let app = app_with_config(&cfg).expect("build app");

    let mut text = String::new();
    for _ in 0..100 {
        text = render_metrics(&app).await;
        if text.contains("price_cycles_total{") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(text.contains("price_cycles_total{source=\"demo\"} 1"), "{text}");
    assert!(text.contains("# HELP price_cycles_total"), "{text}");
    assert!(text.contains("# HELP quotes_fetch_errors_total"), "{text}");
    assert!(text.contains("quotes_fetch_errors_total{kind=\"transport\"} 8"), "{text}");
    assert!(text.contains("price_refresh_interval_secs 60"), "{text}");
}
