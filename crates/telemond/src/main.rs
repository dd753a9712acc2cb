//! Telemond - real-time host telemetry daemon
//!
//! Samples host metrics once per second, maintains a rolling history and
//! a bounded incident log, and fans the merged snapshot out to WebSocket
//! subscribers.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use telemon_lib::{ClientRegistry, MonitorConfig, MonitorMetrics, SystemSampler, TelemetryMonitor};
use telemond::{api, config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting telemond");

    // Load configuration
    let config = config::DaemonConfig::load()?;
    info!(host = %config.host, port = config.port, "Daemon configured");

    // Initialize metrics
    let metrics = MonitorMetrics::new();

    // Build the monitor around the live host sampler
    let sampler = SystemSampler::new();
    let monitor_config = MonitorConfig {
        tick_interval: Duration::from_secs(config.tick_interval_secs),
        ..Default::default()
    };
    let (monitor, handle) = TelemetryMonitor::new(Box::new(sampler), monitor_config);

    // Start the broadcast loop
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let loop_handle = tokio::spawn(monitor.run(shutdown_tx.subscribe()));

    // Start the HTTP/WebSocket server
    let state = api::AppState::new(
        handle,
        Arc::new(ClientRegistry::new()),
        metrics,
        Duration::from_millis(config.termination_grace_ms),
    );
    let api_handle = tokio::spawn(api::serve(config.host.clone(), config.port, state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    let _ = shutdown_tx.send(());
    let _ = loop_handle.await;
    api_handle.abort();

    Ok(())
}
