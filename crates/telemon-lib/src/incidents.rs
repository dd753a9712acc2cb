//! Threshold incident detection
//!
//! This module provides:
//! - A per-metric hysteresis state machine over CPU, memory, and disk usage
//! - A bounded incident log with a permanent startup marker
//!
//! Each monitored metric has a trip threshold and a lower clear threshold.
//! Crossing the trip threshold records one incident and arms the alert;
//! nothing further is recorded until the value falls below the clear
//! threshold, which records a resolution and disarms it. The band between
//! the two thresholds suppresses flapping.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::models::{Incident, IncidentLevel, MetricSample};

/// Maximum number of retained incidents, startup marker included
pub const INCIDENT_CAPACITY: usize = 15;

/// Identifier of an armed alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertKey {
    CpuHigh,
    MemHigh,
    DiskHigh,
}

impl AlertKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKey::CpuHigh => "cpu_high",
            AlertKey::MemHigh => "mem_high",
            AlertKey::DiskHigh => "disk_high",
        }
    }
}

impl std::fmt::Display for AlertKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip/clear thresholds for one monitored metric
struct MetricThreshold {
    key: AlertKey,
    label: &'static str,
    trip: f32,
    clear: f32,
    trip_level: IncidentLevel,
}

const THRESHOLDS: [MetricThreshold; 3] = [
    MetricThreshold {
        key: AlertKey::CpuHigh,
        label: "CPU",
        trip: 80.0,
        clear: 70.0,
        trip_level: IncidentLevel::Warning,
    },
    MetricThreshold {
        key: AlertKey::MemHigh,
        label: "Memory",
        trip: 90.0,
        clear: 80.0,
        trip_level: IncidentLevel::Critical,
    },
    MetricThreshold {
        key: AlertKey::DiskHigh,
        label: "Disk",
        trip: 90.0,
        clear: 85.0,
        trip_level: IncidentLevel::Warning,
    },
];

/// Append-only incident log bounded to [`INCIDENT_CAPACITY`] entries
///
/// The entry at index 0 is the startup marker and is never evicted; on
/// overflow the second-oldest entry is dropped instead.
#[derive(Debug)]
pub struct IncidentLog {
    entries: Vec<Incident>,
}

impl IncidentLog {
    /// Create a log seeded with the startup marker
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            entries: vec![Incident {
                timestamp: started_at,
                level: IncidentLevel::Info,
                message: "Monitoring started".to_string(),
            }],
        }
    }

    /// Append an incident, evicting the second-oldest entry on overflow
    pub fn push(&mut self, incident: Incident) {
        self.entries.push(incident);
        if self.entries.len() > INCIDENT_CAPACITY {
            self.entries.remove(1);
        }
    }

    /// The retained entries, oldest first
    pub fn entries(&self) -> &[Incident] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hysteresis evaluator over the monitored metrics
///
/// Owns the set of armed alert keys; an armed key means the metric last
/// crossed its trip threshold and has not yet fallen below its clear
/// threshold.
#[derive(Debug, Default)]
pub struct ThresholdDetector {
    active: BTreeSet<AlertKey>,
}

impl ThresholdDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one sample against every threshold
    ///
    /// Returns the incidents this tick produced, in metric order. Values
    /// inside a hysteresis band, or holding steady past a threshold they
    /// already crossed, produce nothing.
    pub fn evaluate(&mut self, sample: &MetricSample) -> Vec<Incident> {
        let mut incidents = Vec::new();

        for threshold in &THRESHOLDS {
            let value = match threshold.key {
                AlertKey::CpuHigh => sample.cpu_percent,
                AlertKey::MemHigh => sample.memory_percent,
                AlertKey::DiskHigh => sample.disk_percent,
            };

            if value > threshold.trip && !self.active.contains(&threshold.key) {
                self.active.insert(threshold.key);
                incidents.push(Incident {
                    timestamp: sample.timestamp,
                    level: threshold.trip_level,
                    message: format!("{} usage high: {:.1}%", threshold.label, value),
                });
            } else if value < threshold.clear && self.active.contains(&threshold.key) {
                self.active.remove(&threshold.key);
                incidents.push(Incident {
                    timestamp: sample.timestamp,
                    level: IncidentLevel::Info,
                    message: format!("{} usage back to normal: {:.1}%", threshold.label, value),
                });
            }
        }

        incidents
    }

    /// Whether the given alert is currently armed
    pub fn is_active(&self, key: AlertKey) -> bool {
        self.active.contains(&key)
    }

    /// The armed alert keys, sorted
    pub fn active_keys(&self) -> Vec<String> {
        self.active.iter().map(|k| k.as_str().to_string()).collect()
    }
}
