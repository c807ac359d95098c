//! Default values for every configuration field.

use crate::logging::LogFormat;

/// Host the control plugin listens on.
pub const DEFAULT_HOST: &str = "localhost";

/// TCP port the control plugin listens on.
pub const DEFAULT_PORT: u16 = 9876;

/// Timeout applied when opening a connection, in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Timeout applied to each read and write once connected, in milliseconds.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 30_000;

/// Timeout for the short connection attempts used to find a running instance.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1_000;

/// How long to wait for a freshly launched instance to accept connections.
pub const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 10_000;

/// Sleep between readiness probes after a launch.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Attempts made by the executor before giving up on a connection failure.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Sleep between executor attempts.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "warn";

pub(crate) fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

pub(crate) const fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

pub(crate) const fn default_io_timeout_ms() -> u64 {
    DEFAULT_IO_TIMEOUT_MS
}

pub(crate) const fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

pub(crate) const fn default_launch_timeout_ms() -> u64 {
    DEFAULT_LAUNCH_TIMEOUT_MS
}

pub(crate) const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

pub(crate) const fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

pub(crate) const fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub(crate) const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
