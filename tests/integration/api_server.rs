//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics and the engine-backed routes.


use serde_json::Value;

use test_utils::{TestApiServer, SYMBOL};

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "candlescope");
    assert_eq!(body["engine"], false);
}

#[tokio::test]
async fn health_endpoint_reports_engine_when_configured() {
    let app = TestApiServer::with_engine().await;
    let body: Value = app.server.get("/health").await.json();
    assert_eq!(body["engine"], true);
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let _ = app.server.get("/health").await;

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(
        body.contains("http_requests_total"),
        "Expected http_requests_total metric"
    );
    assert!(
        body.contains("http_request_duration_seconds"),
        "Expected http_request_duration_seconds metric"
    );
    assert!(
        body.contains("http_requests_in_flight"),
        "Expected http_requests_in_flight metric"
    );
}

#[tokio::test]
async fn metrics_count_served_requests() {
    let app = TestApiServer::new().await;
    for _ in 0..3 {
        let _ = app.server.get("/health").await;
    }
    assert!(app.metrics.http_requests_total.get() >= 3);
}

#[tokio::test]
async fn engine_routes_are_unavailable_without_engine() {
    let app = TestApiServer::new().await;

    for route in [
        "/api/screener",
        "/api/signals/open",
        "/api/activity/BBCA.JK",
        "/api/indicators/BBCA.JK",
    ] {
        let response = app.server.get(route).await;
        assert_eq!(response.status_code(), 503, "route {}", route);
    }
}

#[tokio::test]
async fn open_signals_excludes_wait_and_resolved_records() {
    let app = TestApiServer::with_engine().await;
    let response = app.server.get("/api/signals/open").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let signals = body.as_array().unwrap();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0]["symbol"], "TLKM.JK");
    assert_eq!(signals[0]["action"], "BUY");
    assert_eq!(signals[0]["status"], "OPEN");
    assert_eq!(signals[0]["target_price"], 1050.0);
}

#[tokio::test]
async fn activity_reports_volume_breakout() {
    let app = TestApiServer::with_engine().await;
    let response = app.server.get(&format!("/api/activity/{}", SYMBOL)).await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event["date"], "2024-02-29");
    assert_eq!(event["volume"], 5000.0);
    assert_eq!(event["avgVol"], 1000.0);
    let labels: Vec<&str> = event["signals"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(labels, vec!["BIG BUY", "STRONG BULLISH", "BREAKOUT"]);
}

#[tokio::test]
async fn activity_for_unknown_symbol_is_bad_gateway() {
    let app = TestApiServer::with_engine().await;
    // No chart mock for this symbol, so the upstream answers 404
    let response = app.server.get("/api/activity/UNKNOWN.JK").await;
    assert_eq!(response.status_code(), 502);
}

#[tokio::test]
async fn indicators_cover_every_session() {
    let app = TestApiServer::with_engine().await;
    let response = app.server.get(&format!("/api/indicators/{}", SYMBOL)).await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let series = body.as_array().unwrap();
    assert_eq!(series.len(), 60);
    // Not enough history for the averages on the first session
    assert!(series[0].get("ema").is_none());
    assert!(series[0].get("rsi").is_none());

    let last = &series[59];
    assert_eq!(last["close"], 105.0);
    assert!(last["ema"].as_f64().unwrap() > 100.0);
    assert_eq!(last["rsi"], 100.0);
}

#[tokio::test]
async fn screener_runs_on_demand() {
    let app = TestApiServer::with_engine().await;
    let response = app.server.get("/api/screener").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["scanned"], serde_json::json!([SYMBOL]));
    assert!(body["matches"].as_array().unwrap().is_empty());
    assert!(body["failed"].as_array().unwrap().is_empty());
    assert_eq!(body["movers"]["gainers"][0]["symbol"], SYMBOL);
    assert!(body["movers"]["losers"].as_array().unwrap().is_empty());
}
