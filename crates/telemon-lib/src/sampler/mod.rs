//! Host metrics sampling
//!
//! This module provides the sampling contract used by the broadcast loop
//! and its `sysinfo`-backed production implementation. One sampling pass
//! yields host-wide metrics plus the top processes by CPU usage.

mod system;

pub use system::SystemSampler;

use crate::models::{HostSample, ProcessEntry, SystemInfo};
use anyhow::Result;

pub use async_trait::async_trait;

/// Number of processes delivered per sample
pub const TOP_PROCESS_COUNT: usize = 20;

/// Trait for host sampling implementations
#[async_trait]
pub trait Sampler: Send {
    /// Host facts captured at startup
    fn system_info(&self) -> SystemInfo;

    /// Take one point-in-time sample of host and process metrics
    ///
    /// CPU and network readings are deltas since the previous call. May
    /// block on OS queries for up to roughly one sampling interval.
    async fn sample(&mut self) -> Result<HostSample>;
}

/// Select the top `limit` processes by CPU usage, descending
///
/// The sort is stable, so ties keep their original enumeration order.
pub fn top_by_cpu(mut processes: Vec<ProcessEntry>, limit: usize) -> Vec<ProcessEntry> {
    processes.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    processes.truncate(limit);
    processes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pid: u32, cpu: f32) -> ProcessEntry {
        ProcessEntry {
            pid,
            name: format!("proc-{pid}"),
            cpu_percent: cpu,
            memory_percent: 1.0,
        }
    }

    #[test]
    fn test_top_by_cpu_selects_exactly_the_top_20() {
        // 25 entries with distinct usage, lowest first
        let processes: Vec<ProcessEntry> =
            (0..25).map(|i| entry(i, i as f32)).collect();

        let top = top_by_cpu(processes, TOP_PROCESS_COUNT);

        assert_eq!(top.len(), 20);
        assert_eq!(top[0].cpu_percent, 24.0);
        assert_eq!(top[19].cpu_percent, 5.0);
        // entries 0..=4 were discarded
        assert!(top.iter().all(|p| p.cpu_percent >= 5.0));
    }

    #[test]
    fn test_top_by_cpu_ties_keep_enumeration_order() {
        let processes = vec![entry(1, 10.0), entry(2, 10.0), entry(3, 50.0), entry(4, 10.0)];

        let top = top_by_cpu(processes, 4);

        assert_eq!(top[0].pid, 3);
        assert_eq!(top[1].pid, 1);
        assert_eq!(top[2].pid, 2);
        assert_eq!(top[3].pid, 4);
    }

    #[test]
    fn test_top_by_cpu_short_list_unchanged() {
        let processes = vec![entry(1, 3.0), entry(2, 7.0)];

        let top = top_by_cpu(processes, TOP_PROCESS_COUNT);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].pid, 2);
    }
}
