//! Connects to PyMOL, launching it with the control plugin if nothing is
//! listening, then checks that it answers.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    pymol_remote_cli::run_launch(std::env::args_os(), &mut stdout, &mut stderr)
}
