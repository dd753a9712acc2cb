//! Daemon configuration

use anyhow::Result;
use serde::Deserialize;

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for the HTTP/WebSocket server
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the HTTP/WebSocket server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Telemetry sampling cadence in seconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Grace period before a termination request escalates to SIGKILL
    #[serde(default = "default_termination_grace")]
    pub termination_grace_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_tick_interval() -> u64 {
    1
}

fn default_termination_grace() -> u64 {
    2000
}

impl DaemonConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("TELEMON"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| DaemonConfig {
            host: default_host(),
            port: default_port(),
            tick_interval_secs: default_tick_interval(),
            termination_grace_ms: default_termination_grace(),
        }))
    }
}
