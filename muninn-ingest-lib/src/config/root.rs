use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port the tracker-facing TCP listener binds to
    /// Example: "0.0.0.0:8000" or "127.0.0.1:8000"
    #[serde(default = "default_tcp_listen")]
    pub tcp_listen: SocketAddr,
    /// Startup deadline in seconds for sink initialisation
    /// Default: 10
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Sessions idle longer than this many seconds are evicted
    /// Default: 60
    #[serde(default = "default_idle_seconds")]
    pub idle_seconds: u64,
    /// Period in seconds of the idle-session sweep
    /// Default: 10
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    /// Log level when RUST_LOG is not set
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Record sink selection and its settings
    /// Default: memory
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Which record sink the server persists decoded packets into.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// In-process only; records are dropped on shutdown
    Memory,
    /// One JSON object per record, one file per collection, under `path`
    Jsonl { path: PathBuf },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Memory
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tcp_listen: default_tcp_listen(),
            timeout_seconds: default_timeout_seconds(),
            idle_seconds: default_idle_seconds(),
            tick_seconds: default_tick_seconds(),
            log_level: default_log_level(),
            sink: SinkConfig::default(),
        }
    }
}

fn default_tcp_listen() -> SocketAddr {
    "0.0.0.0:8000".parse().unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8000)))
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_idle_seconds() -> u64 {
    60
}

fn default_tick_seconds() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
