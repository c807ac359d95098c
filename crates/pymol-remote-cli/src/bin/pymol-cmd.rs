//! Sends Python code to a running PyMOL and prints its output.
//!
//! Delegates to [`pymol_remote_cli::run_cmd`].

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    pymol_remote_cli::run_cmd(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
