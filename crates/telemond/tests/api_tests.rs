//! Integration tests for the daemon API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use std::time::Duration;
use telemon_lib::{
    ClientRegistry, MonitorConfig, MonitorMetrics, SystemSampler, TelemetryMonitor,
};
use telemond::api;
use tower::ServiceExt;

fn setup_test_app(tick_interval: Duration) -> (axum::Router, api::AppState, TelemetryMonitor) {
    let sampler = SystemSampler::new();
    let config = MonitorConfig {
        tick_interval,
        ..Default::default()
    };
    let (monitor, handle) = TelemetryMonitor::new(Box::new(sampler), config);

    let state = api::AppState::new(
        handle,
        Arc::new(ClientRegistry::new()),
        MonitorMetrics::new(),
        Duration::from_millis(100),
    );
    let router = api::create_router(state.clone());

    (router, state, monitor)
}

#[tokio::test]
async fn test_health_is_ok_with_null_stamp_before_first_tick() {
    let (app, _state, _monitor) = setup_test_app(Duration::from_secs(1));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(health["status"], "ok");
    assert!(health["updated_at"].is_null());
}

#[tokio::test]
async fn test_health_carries_update_stamp_once_the_loop_ran() {
    let (app, _state, monitor) = setup_test_app(Duration::from_millis(50));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let loop_task = tokio::spawn(monitor.run(shutdown_tx.subscribe()));

    // the first interval tick fires immediately; leave room for the
    // sampling pass itself
    tokio::time::sleep(Duration::from_millis(500)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(health["status"], "ok");
    assert!(health["updated_at"].is_string());

    let _ = shutdown_tx.send(());
    let _ = loop_task.await;
}

#[tokio::test]
async fn test_kill_unknown_pid_returns_404() {
    let (app, _state, _monitor) = setup_test_app(Duration::from_secs(1));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/kill/999999999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(error["error"], "Process not found.");
}

#[tokio::test]
async fn test_kill_rejects_a_non_numeric_pid() {
    let (app, _state, _monitor) = setup_test_app(Duration::from_secs(1));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/kill/not-a-pid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state, _monitor) = setup_test_app(Duration::from_secs(1));

    state.metrics.observe_tick_latency(0.002);
    state.metrics.inc_ticks();
    state.metrics.set_connected_clients(1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("telemon_tick_latency_seconds"));
    assert!(metrics_text.contains("telemon_ticks_total"));
    assert!(metrics_text.contains("telemon_connected_clients"));
}
