//! Telemetry library for the real-time host monitor
//!
//! This crate provides the core functionality for:
//! - Host and per-process metrics sampling
//! - Rolling metric history for charting
//! - Threshold incident detection with hysteresis
//! - The snapshot cache and per-second broadcast loop
//! - Real-time client registration and the termination action

pub mod history;
pub mod incidents;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod process;
pub mod registry;
pub mod sampler;

pub use history::{MetricsHistory, HISTORY_CAPACITY};
pub use incidents::{AlertKey, IncidentLog, ThresholdDetector, INCIDENT_CAPACITY};
pub use models::*;
pub use monitor::{MonitorConfig, MonitorHandle, TelemetryMonitor};
pub use observability::MonitorMetrics;
pub use process::{
    terminate_process, TerminationError, TerminationOutcome, DEFAULT_TERMINATION_GRACE,
};
pub use registry::{ClientId, ClientInfo, ClientRegistry};
pub use sampler::{Sampler, SystemSampler, TOP_PROCESS_COUNT};
