//! Error types and diagnostics for the command-line tools.

use std::io;
use std::sync::Arc;

use pymol_remote::{AcquireError, ErrorKind, ExecuteError, SessionError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Hint printed after every connection failure.
pub(crate) const CONNECTION_HINT: &str = "Is PyMOL running with the socket plugin?";

/// Usage text printed when `pymol-cmd` receives no code.
pub(crate) const CMD_USAGE: &str = "Usage: pymol-cmd <python code>\n       echo '<python code>' | pymol-cmd -";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("{usage}", usage = CMD_USAGE)]
    MissingCode,
    #[error("failed to read code from stdin: {0}")]
    ReadStdin(#[source] io::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("Connection error: {0}\n{hint}", hint = CONNECTION_HINT)]
    Connect(#[source] SessionError),
    #[error("Connection error: {0}\n{hint}", hint = CONNECTION_HINT)]
    ConnectionLost(#[source] ExecuteError),
    #[error("PyMOL error: {0}")]
    Remote(#[source] ExecuteError),
    #[error("Error: {0}")]
    Execute(#[source] ExecuteError),
    #[error("Error: {0}")]
    Acquire(#[source] AcquireError),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl From<ExecuteError> for AppError {
    fn from(error: ExecuteError) -> Self {
        match error.kind() {
            ErrorKind::Connection => Self::ConnectionLost(error),
            ErrorKind::RemoteExecution => Self::Remote(error),
            _ => Self::Execute(error),
        }
    }
}

impl AppError {
    /// Help and version requests are reported on stdout and succeed.
    pub(crate) fn is_informational(&self) -> bool {
        matches!(self, Self::CliUsage(error) if !error.use_stderr())
    }
}
