use std::fmt;
use std::time::Duration;

/// Closed classification shared by every error in the crate.
///
/// Callers branch on the kind rather than on individual variants: only
/// [`ErrorKind::Connection`] is ever retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The socket could not be opened, was closed by the peer, or faulted.
    Connection,
    /// A read or a readiness wait exceeded its deadline.
    Timeout,
    /// The plugin ran the code and reported a failure.
    RemoteExecution,
    /// A required executable or file is missing, or could not be started.
    Configuration,
    /// A complete message arrived that is not a valid response.
    Protocol,
}

impl ErrorKind {
    /// Returns true for the only kind the executor retries.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Connection)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::RemoteExecution => "remote execution",
            Self::Configuration => "configuration",
            Self::Protocol => "protocol",
        };
        f.write_str(label)
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
