//! Process spawning for PyMOL.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use super::error::LaunchError;

/// Builds the PyMOL argument list: the optional file to open, then a
/// `-d` command that runs the control plugin.
#[must_use]
pub fn launch_arguments(file: Option<&Path>, plugin: &Path) -> Vec<OsString> {
    let mut arguments = Vec::with_capacity(3);
    if let Some(file) = file {
        arguments.push(file.as_os_str().to_owned());
    }
    arguments.push(OsString::from("-d"));
    let mut run = OsString::from("run ");
    run.push(plugin.as_os_str());
    arguments.push(run);
    arguments
}

/// Starts PyMOL detached from our stdin, sharing our stdout and stderr.
pub(super) fn spawn_pymol(executable: &Path, arguments: &[OsString]) -> Result<Child, LaunchError> {
    Command::new(executable)
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            executable: executable.to_path_buf(),
            source,
        })
}
