//! Argument definitions for the command-line tools.

use std::path::PathBuf;

use clap::Parser;

/// Sends Python code to a running PyMOL and prints its output.
#[derive(Parser, Debug)]
#[command(name = "pymol-cmd")]
pub(crate) struct CmdCli {
    /// Code to run, joined with spaces; `-` reads it from stdin.
    #[arg(
        value_name = "CODE",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub(crate) code: Vec<String>,
}

impl CmdCli {
    /// Returns true when the code should be read from stdin.
    pub(crate) fn reads_stdin(&self) -> bool {
        matches!(self.code.as_slice(), [only] if only == "-")
    }
}

/// Connects to PyMOL, launching it with the control plugin when needed.
#[derive(Parser, Debug)]
#[command(name = "pymol-launch")]
pub(crate) struct LaunchCli {
    /// Structure or session file to open in a newly launched PyMOL.
    #[arg(value_name = "FILE")]
    pub(crate) file: Option<PathBuf>,
}
