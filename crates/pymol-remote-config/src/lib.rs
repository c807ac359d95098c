//! Configuration for the PyMOL remote-control client.
//!
//! Values are layered with `ortho_config`: built-in defaults, then an
//! optional TOML file named by `--config-path` or `PYMOL_REMOTE_CONFIG_PATH`,
//! then `PYMOL_REMOTE_*` environment variables, then command-line flags.

mod defaults;
mod endpoint;
mod logging;

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_IO_TIMEOUT_MS, DEFAULT_LAUNCH_TIMEOUT_MS,
    DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT, DEFAULT_PROBE_TIMEOUT_MS,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS,
};
pub use endpoint::{Endpoint, EndpointParseError};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PYMOL_REMOTE")]
pub struct Config {
    /// Host the control plugin listens on.
    #[serde(default = "defaults::default_host")]
    pub host: String,
    /// TCP port the control plugin listens on.
    #[serde(default = "defaults::default_port")]
    pub port: u16,
    /// Connection timeout in milliseconds.
    #[serde(default = "defaults::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Read and write timeout in milliseconds.
    #[serde(default = "defaults::default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    /// Timeout for the short connection used to detect a running instance.
    #[serde(default = "defaults::default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Deadline for a launched instance to accept connections.
    #[serde(default = "defaults::default_launch_timeout_ms")]
    pub launch_timeout_ms: u64,
    /// Sleep between readiness probes.
    #[serde(default = "defaults::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Executor attempts per command.
    #[serde(default = "defaults::default_retry_attempts")]
    pub retry_attempts: u32,
    /// Sleep between executor attempts in milliseconds.
    #[serde(default = "defaults::default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Explicit PyMOL executable, bypassing discovery.
    #[serde(default)]
    pub pymol_executable: Option<Utf8PathBuf>,
    /// Explicit control plugin script, bypassing discovery.
    #[serde(default)]
    pub plugin_path: Option<Utf8PathBuf>,
    /// Tracing filter expression.
    #[serde(default = "defaults::default_log_filter")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: defaults::default_host(),
            port: defaults::default_port(),
            connect_timeout_ms: defaults::default_connect_timeout_ms(),
            io_timeout_ms: defaults::default_io_timeout_ms(),
            probe_timeout_ms: defaults::default_probe_timeout_ms(),
            launch_timeout_ms: defaults::default_launch_timeout_ms(),
            poll_interval_ms: defaults::default_poll_interval_ms(),
            retry_attempts: defaults::default_retry_attempts(),
            retry_backoff_ms: defaults::default_retry_backoff_ms(),
            pymol_executable: None,
            plugin_path: None,
            log_filter: defaults::default_log_filter(),
            log_format: defaults::default_log_format(),
        }
    }
}

impl Config {
    /// Returns the plugin endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read and write timeout.
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Timeout for detection and readiness probes.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Deadline for a launched instance to become reachable.
    #[must_use]
    pub const fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }

    /// Sleep between readiness probes.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Sleep between executor attempts.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Returns a copy addressing `endpoint` instead of the configured one.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &Endpoint) -> Self {
        self.host.clone_from(&endpoint.host);
        self.port = endpoint.port;
        self
    }
}
