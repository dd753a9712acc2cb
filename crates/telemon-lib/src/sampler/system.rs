//! `sysinfo`-backed host sampler

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;
use sysinfo::{Disks, Networks, ProcessesToUpdate, System};

use super::{top_by_cpu, Sampler, TOP_PROCESS_COUNT};
use crate::models::{HostSample, MetricSample, ProcessEntry, SystemInfo};

/// Samples the local host through `sysinfo`
///
/// Keeps the `System`, `Disks`, and `Networks` handles alive between calls
/// so CPU usage and network counters are computed against the previous
/// refresh, matching the underlying OS counter semantics.
pub struct SystemSampler {
    sys: System,
    disks: Disks,
    networks: Networks,
    info: SystemInfo,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();

        let info = SystemInfo {
            cpu_count: sys.cpus().len(),
            cpu_freq: sys.cpus().first().map(|c| c.frequency()).unwrap_or(0),
            mem_total: sys.total_memory(),
            // filled in on the first tick
            disk_total: 0,
            disk_free: 0,
            boot_time: DateTime::from_timestamp(System::boot_time() as i64, 0)
                .unwrap_or_else(Utc::now),
            os_name: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        };

        Self {
            sys,
            disks,
            networks,
            info,
        }
    }

    /// The volume reported in disk metrics: the root mount when present,
    /// otherwise the largest volume
    fn root_disk_usage(&self) -> (u64, u64) {
        self.disks
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| self.disks.iter().max_by_key(|d| d.total_space()))
            .map(|d| (d.total_space(), d.available_space()))
            .unwrap_or((0, 0))
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Sampler for SystemSampler {
    fn system_info(&self) -> SystemInfo {
        self.info.clone()
    }

    async fn sample(&mut self) -> Result<HostSample> {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.sys.refresh_processes(ProcessesToUpdate::All, true);
        self.disks.refresh(true);
        self.networks.refresh(true);

        let mem_total = self.sys.total_memory();
        let memory_percent = if mem_total > 0 {
            self.sys.used_memory() as f32 / mem_total as f32 * 100.0
        } else {
            0.0
        };

        let (disk_total, disk_free) = self.root_disk_usage();
        let disk_percent = if disk_total > 0 {
            disk_total.saturating_sub(disk_free) as f32 / disk_total as f32 * 100.0
        } else {
            0.0
        };

        let (net_recv, net_sent) = self
            .networks
            .iter()
            .fold((0u64, 0u64), |(rx, tx), (_, data)| {
                (rx + data.total_received(), tx + data.total_transmitted())
            });

        // Processes that vanished between refreshes are already gone from
        // the table; unreadable fields degrade to defaults instead of
        // failing the whole pass.
        let mut processes: Vec<ProcessEntry> = Vec::with_capacity(self.sys.processes().len());
        for (pid, process) in self.sys.processes() {
            let name = process.name().to_string_lossy();
            let name = if name.is_empty() {
                "unknown".to_string()
            } else {
                name.into_owned()
            };
            let memory_percent = if mem_total > 0 {
                process.memory() as f32 / mem_total as f32 * 100.0
            } else {
                0.0
            };
            processes.push(ProcessEntry {
                pid: pid.as_u32(),
                name,
                cpu_percent: process.cpu_usage(),
                memory_percent,
            });
        }

        Ok(HostSample {
            metrics: MetricSample {
                cpu_percent: self.sys.global_cpu_usage(),
                memory_percent,
                disk_percent,
                net_sent,
                net_recv,
                disk_total,
                disk_free,
                timestamp: Utc::now(),
            },
            processes: top_by_cpu(processes, TOP_PROCESS_COUNT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_returns_plausible_readings() {
        let mut sampler = SystemSampler::new();
        let sample = sampler.sample().await.unwrap();

        assert!(sample.metrics.memory_percent >= 0.0);
        assert!(sample.metrics.memory_percent <= 100.0);
        assert!(sample.processes.len() <= TOP_PROCESS_COUNT);
        assert!(sample.processes.iter().all(|p| !p.name.is_empty()));
    }

    #[test]
    fn test_system_info_captured_at_startup() {
        let sampler = SystemSampler::new();
        let info = sampler.system_info();

        assert!(info.cpu_count > 0);
        assert!(info.mem_total > 0);
        // disk totals are deferred to the first tick
        assert_eq!(info.disk_total, 0);
    }
}
