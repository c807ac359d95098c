//! Error types for launching PyMOL.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while locating, starting or waiting for PyMOL.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No PyMOL executable was found.
    #[error(
        "PyMOL executable not found on PATH or in the standard install locations; set pymol_executable to override"
    )]
    ExecutableNotFound,
    /// The control plugin script is missing.
    #[error("control plugin not found at {}", expected.display())]
    PluginNotFound {
        /// First location that was checked.
        expected: PathBuf,
    },
    /// The process could not be started.
    #[error("failed to launch PyMOL '{}': {source}", executable.display())]
    Spawn {
        /// Executable that was run.
        executable: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },
    /// The process exited with a failure before the socket accepted
    /// connections.
    #[error("PyMOL exited before its control socket was ready ({status})")]
    ExitedEarly {
        /// Exit status of the launched process.
        status: ExitStatus,
    },
    /// The socket did not accept connections before the deadline.
    #[error("PyMOL did not accept connections at {endpoint} within {timeout_ms} ms")]
    StartupTimeout {
        /// Address that was polled.
        endpoint: String,
        /// Deadline that elapsed.
        timeout_ms: u64,
    },
    /// Polling the child process failed.
    #[error("failed to monitor PyMOL launch: {source}")]
    Monitor {
        /// Underlying cause.
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ExecutableNotFound | Self::PluginNotFound { .. } | Self::Spawn { .. } => {
                ErrorKind::Configuration
            }
            Self::StartupTimeout { .. } => ErrorKind::Timeout,
            Self::ExitedEarly { .. } | Self::Monitor { .. } => ErrorKind::Connection,
        }
    }
}
