//! HTTP and WebSocket API for the telemetry daemon
//!
//! `/ws` is the real-time channel: a connecting client is registered,
//! immediately receives the current merged snapshot, and then gets every
//! per-tick update until it disconnects or a delivery fails. `/health`
//! and `/metrics` are answered from the cache and the Prometheus
//! registry; `/kill/:pid` is the termination action.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use telemon_lib::{
    terminate_process, ClientRegistry, MonitorHandle, MonitorMetrics, TelemetrySnapshot,
    TerminationError, TerminationOutcome,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: MonitorHandle,
    pub registry: Arc<ClientRegistry>,
    pub metrics: MonitorMetrics,
    pub termination_grace: Duration,
}

impl AppState {
    pub fn new(
        monitor: MonitorHandle,
        registry: Arc<ClientRegistry>,
        metrics: MonitorMetrics,
        termination_grace: Duration,
    ) -> Self {
        Self {
            monitor,
            registry,
            metrics,
            termination_grace,
        }
    }
}

/// Health check answered from the snapshot cache; never samples
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.monitor.latest();

    Json(json!({
        "status": "ok",
        "updated_at": snapshot.updated_at,
    }))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Upgrade to the real-time telemetry channel
async fn ws_telemetry(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_telemetry(socket, addr, state))
}

/// Per-connection delivery task
///
/// A failed send tears down only this connection; the broadcast loop and
/// every other subscriber are unaffected.
async fn stream_telemetry(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let client_id = state.registry.register(Some(addr.to_string()));
    state
        .metrics
        .set_connected_clients(state.registry.len() as i64);

    let (mut sink, mut stream) = socket.split();
    let mut updates = state.monitor.subscribe();
    let monitor = state.monitor.clone();

    let mut send_task = tokio::spawn(async move {
        // first delivery is the committed cache, not the next tick
        if send_snapshot(&mut sink, &monitor.latest()).await.is_err() {
            return;
        }
        loop {
            match updates.recv().await {
                Ok(snapshot) => {
                    if send_snapshot(&mut sink, &snapshot).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(client_id, skipped, "Client lagging, resuming with the next snapshot");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    // either side finishing tears down the other
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.deregister(client_id);
    state
        .metrics
        .set_connected_clients(state.registry.len() as i64);
    debug!(client_id, "Client disconnected");
}

async fn send_snapshot(
    sink: &mut SplitSink<WebSocket, Message>,
    snapshot: &TelemetrySnapshot,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(snapshot).map_err(axum::Error::new)?;
    sink.send(Message::Text(payload)).await
}

/// Termination action: graceful first, forced on timeout
async fn kill_process(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> impl IntoResponse {
    match terminate_process(pid, state.termination_grace).await {
        Ok(TerminationOutcome::Terminated) => (
            StatusCode::OK,
            Json(json!({ "message": format!("Process {pid} terminated successfully.") })),
        ),
        Ok(TerminationOutcome::ForceKilled) => (
            StatusCode::OK,
            Json(json!({ "message": format!("Process {pid} force-killed successfully.") })),
        ),
        Err(TerminationError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Process not found." })),
        ),
        Err(e) => {
            error!(pid, error = %e, "Failed to terminate process");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to terminate process." })),
            )
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws_telemetry))
        .route("/kill/:pid", post(kill_process))
        .with_state(state)
}

/// Start the API server
pub async fn serve(host: String, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{host}:{port}");
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
