//! Process launcher: locates PyMOL, starts it with the control plugin
//! preloaded and waits for the control socket.

mod error;
mod locate;
mod readiness;
mod spawning;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus};
use std::time::Duration;

use pymol_remote_config::Config;
use tracing::info;

pub use error::LaunchError;
pub use locate::{
    EXECUTABLE_NAME, ExecutableSearch, PLUGIN_FILE_NAME, is_executable_file, locate_plugin,
    macos_locations, plugin_candidates, well_known_locations,
};
pub use spawning::launch_arguments;

use readiness::{ReadinessProbe, wait_for_socket};
use spawning::spawn_pymol;

pub(crate) const LAUNCHER_TARGET: &str = "pymol_remote::launcher";

/// Finds the PyMOL executable on `PATH` or in the platform's install
/// locations.
#[must_use]
pub fn locate_executable() -> Option<PathBuf> {
    ExecutableSearch::system(None).locate()
}

/// Returns true when [`locate_executable`] finds PyMOL.
#[must_use]
pub fn is_installed() -> bool {
    locate_executable().is_some()
}

/// Starts PyMOL instances configured to accept remote control.
#[derive(Debug, Clone)]
pub struct Launcher {
    search: ExecutableSearch,
    plugin_override: Option<PathBuf>,
    probe: ReadinessProbe,
}

impl Launcher {
    /// Builds a launcher from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let executable = config
            .pymol_executable
            .as_ref()
            .map(|path| path.as_std_path().to_path_buf());
        Self {
            search: ExecutableSearch::system(executable),
            plugin_override: config
                .plugin_path
                .as_ref()
                .map(|path| path.as_std_path().to_path_buf()),
            probe: ReadinessProbe {
                endpoint: config.endpoint(),
                probe_timeout: config.probe_timeout(),
                poll_interval: config.poll_interval(),
            },
        }
    }

    /// Replaces the executable search.
    #[must_use]
    pub fn with_search(mut self, search: ExecutableSearch) -> Self {
        self.search = search;
        self
    }

    /// Executable this launcher would run.
    #[must_use]
    pub fn locate_executable(&self) -> Option<PathBuf> {
        self.search.locate()
    }

    /// Starts PyMOL, optionally opening `file`.
    ///
    /// When `wait_for_socket` is set, blocks until the control socket accepts
    /// a connection or `timeout` elapses. The process is never killed here,
    /// even on failure.
    ///
    /// # Errors
    ///
    /// - [`LaunchError::ExecutableNotFound`] or [`LaunchError::PluginNotFound`]
    ///   before anything is started.
    /// - [`LaunchError::Spawn`] when the process cannot be started.
    /// - [`LaunchError::ExitedEarly`] when it dies with a failure status while
    ///   being polled.
    /// - [`LaunchError::StartupTimeout`] when the socket stays closed.
    pub fn launch(
        &self,
        file: Option<&Path>,
        wait_for_socket_ready: bool,
        timeout: Duration,
    ) -> Result<LaunchedProcess, LaunchError> {
        let executable = self
            .search
            .locate()
            .ok_or(LaunchError::ExecutableNotFound)?;
        let plugin = locate_plugin(self.plugin_override.as_deref())?;
        let arguments = launch_arguments(file, &plugin);
        info!(
            target: LAUNCHER_TARGET,
            executable = %executable.display(),
            plugin = %plugin.display(),
            file = ?file,
            "launching PyMOL"
        );
        let mut child = spawn_pymol(&executable, &arguments)?;
        if wait_for_socket_ready {
            wait_for_socket(&mut child, &self.probe, timeout)?;
            info!(
                target: LAUNCHER_TARGET,
                endpoint = %self.probe.endpoint,
                pid = child.id(),
                "PyMOL control socket ready"
            );
        }
        Ok(LaunchedProcess { child, executable })
    }
}

/// Handle to a PyMOL process started by [`Launcher::launch`].
///
/// Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct LaunchedProcess {
    child: Child,
    executable: PathBuf,
}

impl LaunchedProcess {
    /// Operating-system process id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Executable that was started.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Returns the exit status if the process has finished.
    ///
    /// # Errors
    ///
    /// Returns an error when the status cannot be queried.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Blocks until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error when waiting fails.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }

    /// Kills the process.
    ///
    /// # Errors
    ///
    /// Returns an error when the signal cannot be delivered.
    pub fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    /// Releases the underlying child handle.
    #[must_use]
    pub fn into_child(self) -> Child {
        self.child
    }
}
