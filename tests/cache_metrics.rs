mod support;

use std::collections::HashMap;

use axum::http::StatusCode;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use notifier::cache::{METRIC_CACHE_HIT, METRIC_CACHE_MISS};
use notifier::infra::http::METRIC_HTTP_LATENCY_MS;

use support::{empty_request, test_app};

#[tokio::test]
async fn cached_listing_emits_hit_miss_and_latency_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let app = test_app();
    app.documents.seed("Plan", "");

    for _ in 0..3 {
        let response = app
            .send(empty_request("GET", "/api/documents/cached/"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mut counters = HashMap::new();
    let mut histograms = Vec::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let name = composite_key.key().name().to_string();
        match value {
            DebugValue::Counter(count) => {
                *counters.entry(name).or_insert(0) += count;
            }
            DebugValue::Histogram(_) => histograms.push(name),
            _ => {}
        }
    }

    assert_eq!(counters.get(METRIC_CACHE_MISS), Some(&1));
    assert_eq!(counters.get(METRIC_CACHE_HIT), Some(&2));
    assert!(
        histograms.iter().any(|name| name == METRIC_HTTP_LATENCY_MS),
        "missing metric: {METRIC_HTTP_LATENCY_MS}"
    );
}
