//! Core data models for the telemetry agent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point-in-time reading of host-wide metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub net_sent: u64,
    pub net_recv: u64,
    pub disk_total: u64,
    pub disk_free: u64,
    pub timestamp: DateTime<Utc>,
}

/// A single process as delivered to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

/// Mostly-static host facts captured once at startup
///
/// Disk totals are the exception: volumes can come and go, so they are
/// refreshed on every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu_count: usize,
    pub cpu_freq: u64,
    pub mem_total: u64,
    pub disk_total: u64,
    pub disk_free: u64,
    pub boot_time: DateTime<Utc>,
    pub os_name: String,
}

/// Reduced projection of a metric sample retained for charting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub cpu: f32,
    pub memory: f32,
    pub disk: f32,
    pub timestamp: DateTime<Utc>,
}

/// Severity of a recorded incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentLevel {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for IncidentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentLevel::Info => write!(f, "INFO"),
            IncidentLevel::Warning => write!(f, "WARNING"),
            IncidentLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A threshold-crossing event recorded in the bounded incident log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub timestamp: DateTime<Utc>,
    pub level: IncidentLevel,
    pub message: String,
}

/// Everything one sampling pass produces
#[derive(Debug, Clone)]
pub struct HostSample {
    pub metrics: MetricSample,
    pub processes: Vec<ProcessEntry>,
}

/// The merged view pushed to clients and served from the cache
///
/// Replaced wholesale after each tick; readers always see either the
/// previous or the new value, never a partial update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub cpu: f32,
    pub memory: f32,
    pub disk_percent: f32,
    pub net_sent: u64,
    pub net_recv: u64,
    pub processes: Vec<ProcessEntry>,
    pub system: SystemInfo,
    pub history: Vec<HistoryPoint>,
    pub incidents: Vec<Incident>,
    pub active_alerts: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TelemetrySnapshot {
    /// The startup cache value, before any tick has completed
    pub fn initial(system: SystemInfo, incidents: Vec<Incident>) -> Self {
        Self {
            cpu: 0.0,
            memory: 0.0,
            disk_percent: 0.0,
            net_sent: 0,
            net_recv: 0,
            processes: Vec::new(),
            system,
            history: Vec::new(),
            incidents,
            active_alerts: Vec::new(),
            updated_at: None,
        }
    }
}
