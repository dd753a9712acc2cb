//! Snapshot cache and broadcast loop
//!
//! The monitor is the single writer over all mutable telemetry state.
//! Every tick it samples the host, feeds the history ring and the
//! incident detector, commits a freshly merged snapshot to the cache,
//! and pushes it to every subscriber. Readers take the cache through a
//! cloneable [`MonitorHandle`] and never coordinate with the writer
//! beyond the whole-value replacement.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::history::MetricsHistory;
use crate::incidents::{IncidentLog, ThresholdDetector};
use crate::models::{HistoryPoint, HostSample, IncidentLevel, SystemInfo, TelemetrySnapshot};
use crate::observability::MonitorMetrics;
use crate::sampler::Sampler;

/// Configuration for the broadcast loop
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Sampling cadence (default: 1 second)
    pub tick_interval: Duration,
    /// Buffered snapshots per slow subscriber before it starts lagging
    pub broadcast_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            broadcast_capacity: 32,
        }
    }
}

/// Read-side handle to the monitor
///
/// `latest` returns the last committed snapshot; `subscribe` attaches a
/// receiver that gets every snapshot published after the call.
#[derive(Clone)]
pub struct MonitorHandle {
    cache: watch::Receiver<Arc<TelemetrySnapshot>>,
    updates: broadcast::Sender<Arc<TelemetrySnapshot>>,
}

impl MonitorHandle {
    /// The most recently committed snapshot
    pub fn latest(&self) -> Arc<TelemetrySnapshot> {
        self.cache.borrow().clone()
    }

    /// Subscribe to per-tick snapshot pushes
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TelemetrySnapshot>> {
        self.updates.subscribe()
    }
}

/// Owner of all mutable telemetry state, advanced once per tick
pub struct TelemetryMonitor {
    sampler: Box<dyn Sampler>,
    config: MonitorConfig,
    system_info: SystemInfo,
    history: MetricsHistory,
    detector: ThresholdDetector,
    incidents: IncidentLog,
    cache_tx: watch::Sender<Arc<TelemetrySnapshot>>,
    updates_tx: broadcast::Sender<Arc<TelemetrySnapshot>>,
    metrics: MonitorMetrics,
}

impl TelemetryMonitor {
    /// Create the monitor and its read-side handle
    pub fn new(sampler: Box<dyn Sampler>, config: MonitorConfig) -> (Self, MonitorHandle) {
        let system_info = sampler.system_info();
        let incidents = IncidentLog::new(Utc::now());
        let initial = Arc::new(TelemetrySnapshot::initial(
            system_info.clone(),
            incidents.entries().to_vec(),
        ));

        let (cache_tx, cache_rx) = watch::channel(initial);
        let (updates_tx, _) = broadcast::channel(config.broadcast_capacity);

        let handle = MonitorHandle {
            cache: cache_rx,
            updates: updates_tx.clone(),
        };

        let monitor = Self {
            sampler,
            config,
            system_info,
            history: MetricsHistory::new(),
            detector: ThresholdDetector::new(),
            incidents,
            cache_tx,
            updates_tx,
            metrics: MonitorMetrics::new(),
        };

        (monitor, handle)
    }

    /// Run the broadcast loop until shutdown
    ///
    /// A slow sample delays the next tick rather than bunching ticks up
    /// behind it.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "Starting telemetry broadcast loop"
        );

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down telemetry broadcast loop");
                    break;
                }
            }
        }
    }

    /// One full pass: sample, record, detect, commit, broadcast
    ///
    /// A sampling failure leaves the previous snapshot in place and the
    /// loop intact; the next scheduled tick is the retry.
    async fn tick(&mut self) {
        let started = Instant::now();

        let sample = match self.sampler.sample().await {
            Ok(sample) => sample,
            Err(e) => {
                self.metrics.inc_tick_errors();
                warn!(error = %e, "Sampling failed, keeping previous snapshot");
                return;
            }
        };

        self.history.record(HistoryPoint {
            cpu: sample.metrics.cpu_percent,
            memory: sample.metrics.memory_percent,
            disk: sample.metrics.disk_percent,
            timestamp: sample.metrics.timestamp,
        });

        for incident in self.detector.evaluate(&sample.metrics) {
            match incident.level {
                IncidentLevel::Critical => warn!(
                    level = %incident.level,
                    message = %incident.message,
                    "Incident recorded"
                ),
                _ => info!(
                    level = %incident.level,
                    message = %incident.message,
                    "Incident recorded"
                ),
            }
            self.metrics.inc_incidents();
            self.incidents.push(incident);
        }

        let snapshot = Arc::new(self.build_snapshot(sample));
        self.cache_tx.send_replace(snapshot.clone());
        // no live subscribers is fine, the cache still advanced
        let _ = self.updates_tx.send(snapshot);

        self.metrics.inc_ticks();
        self.metrics
            .observe_tick_latency(started.elapsed().as_secs_f64());
    }

    fn build_snapshot(&self, sample: HostSample) -> TelemetrySnapshot {
        let metrics = sample.metrics;
        let mut system = self.system_info.clone();
        system.disk_total = metrics.disk_total;
        system.disk_free = metrics.disk_free;

        TelemetrySnapshot {
            cpu: metrics.cpu_percent,
            memory: metrics.memory_percent,
            disk_percent: metrics.disk_percent,
            net_sent: metrics.net_sent,
            net_recv: metrics.net_recv,
            processes: sample.processes,
            system,
            history: self.history.snapshot(),
            incidents: self.incidents.entries().to_vec(),
            active_alerts: self.detector.active_keys(),
            updated_at: Some(metrics.timestamp),
        }
    }
}
