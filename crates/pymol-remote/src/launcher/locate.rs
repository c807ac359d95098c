//! Discovery of the PyMOL executable and the control plugin script.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::LAUNCHER_TARGET;
use super::error::LaunchError;

/// Name searched for on `PATH`.
pub const EXECUTABLE_NAME: &str = "pymol";

/// File name of the control plugin script.
pub const PLUGIN_FILE_NAME: &str = "claude_socket_plugin.py";

const MACOS_BUNDLE_BINARY: &str = "PyMOL.app/Contents/MacOS/PyMOL";

/// Where to look for the PyMOL executable, in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutableSearch {
    /// Explicit executable; when set, nothing else is consulted.
    pub override_path: Option<PathBuf>,
    /// `PATH`-style list of directories searched for [`EXECUTABLE_NAME`].
    pub path_var: Option<OsString>,
    /// Fixed install locations checked last.
    pub well_known: Vec<PathBuf>,
}

impl ExecutableSearch {
    /// Search over the process `PATH` and this platform's install locations.
    #[must_use]
    pub fn system(override_path: Option<PathBuf>) -> Self {
        Self {
            override_path,
            path_var: env::var_os("PATH"),
            well_known: well_known_locations(),
        }
    }

    /// Returns the first usable executable.
    ///
    /// Candidates outside `PATH` are accepted only when they are regular
    /// files with an execute bit.
    #[must_use]
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = &self.override_path {
            if is_executable_file(path) {
                return Some(path.clone());
            }
            warn!(
                target: LAUNCHER_TARGET,
                path = %path.display(),
                "configured PyMOL executable is not an executable file"
            );
            return None;
        }
        if let Some(found) = self.search_path() {
            return Some(found);
        }
        self.well_known
            .iter()
            .find(|candidate| is_executable_file(candidate))
            .cloned()
    }

    fn search_path(&self) -> Option<PathBuf> {
        let path_var = self.path_var.as_ref()?;
        let cwd = env::current_dir().ok()?;
        match which::which_in(EXECUTABLE_NAME, Some(path_var), cwd) {
            Ok(found) => Some(found),
            Err(error) => {
                debug!(
                    target: LAUNCHER_TARGET,
                    error = %error,
                    "PyMOL not found on PATH"
                );
                None
            }
        }
    }
}

/// Install locations checked after `PATH` on this platform.
#[must_use]
pub fn well_known_locations() -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        macos_locations(dirs::home_dir().as_deref())
    } else {
        Vec::new()
    }
}

/// Application bundle locations, system-wide first.
#[must_use]
pub fn macos_locations(home: Option<&Path>) -> Vec<PathBuf> {
    let mut locations = vec![Path::new("/Applications").join(MACOS_BUNDLE_BINARY)];
    if let Some(home) = home {
        locations.push(home.join("Applications").join(MACOS_BUNDLE_BINARY));
    }
    locations
}

/// Returns true for a regular file the current user may execute.
#[must_use]
pub fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Plugin locations derived from the directory holding the running binary.
#[must_use]
pub fn plugin_candidates(executable_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![executable_dir.join(PLUGIN_FILE_NAME)];
    if let Some(parent) = executable_dir.parent() {
        candidates.push(parent.join(PLUGIN_FILE_NAME));
    }
    candidates
}

/// Resolves the control plugin script.
///
/// An override must exist as given. Otherwise the script is looked for next
/// to the running binary, then one directory up.
///
/// # Errors
///
/// Returns [`LaunchError::PluginNotFound`] naming the first location checked.
pub fn locate_plugin(override_path: Option<&Path>) -> Result<PathBuf, LaunchError> {
    if let Some(path) = override_path {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(LaunchError::PluginNotFound {
                expected: path.to_path_buf(),
            })
        };
    }
    let executable_dir = env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    find_plugin_in(&executable_dir)
}

pub(super) fn find_plugin_in(executable_dir: &Path) -> Result<PathBuf, LaunchError> {
    let candidates = plugin_candidates(executable_dir);
    if let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) {
        return Ok(found.clone());
    }
    Err(LaunchError::PluginNotFound {
        expected: candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| PathBuf::from(PLUGIN_FILE_NAME)),
    })
}
