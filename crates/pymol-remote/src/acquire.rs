//! Session acquisition: attach to a running PyMOL, else launch one.

use std::path::Path;

use pymol_remote_config::Config;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ErrorKind;
use crate::executor::{Executor, RetryPolicy};
use crate::launcher::{LaunchError, LaunchedProcess, Launcher};
use crate::session::{Session, SessionError, SessionSettings};

const ACQUIRE_TARGET: &str = "pymol_remote::acquire";

/// A connected executor, plus the process handle when PyMOL had to be
/// started.
#[derive(Debug)]
pub struct Acquired {
    /// Executor with an open session.
    pub executor: Executor,
    /// The launched process; `None` when an existing instance was reused.
    pub process: Option<LaunchedProcess>,
}

impl Acquired {
    /// Returns true when a new instance was started.
    #[must_use]
    pub const fn launched(&self) -> bool {
        self.process.is_some()
    }
}

/// Errors raised by [`connect_or_launch`].
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Launching a new instance failed.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// The launched instance became reachable but the session could not
    /// connect.
    #[error("PyMOL was launched but the session could not connect: {source}")]
    Connect {
        /// Underlying cause.
        #[source]
        source: SessionError,
    },
}

impl AcquireError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Launch(error) => error.kind(),
            Self::Connect { source } => source.kind(),
        }
    }
}

/// Connects to a running PyMOL or launches one, optionally opening `file`.
///
/// # Errors
///
/// Returns [`AcquireError`] when no instance is reachable and launching or
/// connecting to a new one fails.
pub fn connect_or_launch(config: &Config, file: Option<&Path>) -> Result<Acquired, AcquireError> {
    connect_or_launch_with(config, &Launcher::from_config(config), file)
}

/// [`connect_or_launch`] with an explicit launcher.
///
/// # Errors
///
/// See [`connect_or_launch`].
pub fn connect_or_launch_with(
    config: &Config,
    launcher: &Launcher,
    file: Option<&Path>,
) -> Result<Acquired, AcquireError> {
    let mut session = Session::new(SessionSettings::from(config));
    let policy = RetryPolicy::from(config);
    match session.connect(config.probe_timeout()) {
        Ok(()) => {
            info!(
                target: ACQUIRE_TARGET,
                endpoint = %session.endpoint(),
                "connected to running PyMOL"
            );
            return Ok(Acquired {
                executor: Executor::new(session, policy),
                process: None,
            });
        }
        Err(error) => {
            debug!(
                target: ACQUIRE_TARGET,
                error = %error,
                "no running PyMOL; launching"
            );
        }
    }
    let process = launcher.launch(file, true, config.launch_timeout())?;
    session
        .connect(config.connect_timeout())
        .map_err(|source| AcquireError::Connect { source })?;
    Ok(Acquired {
        executor: Executor::new(session, policy),
        process: Some(process),
    })
}
