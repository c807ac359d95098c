//! Command-line runtime for the PyMOL remote-control tools.
//!
//! Two entry points back the binaries: [`run_cmd`] sends one snippet of code
//! to a running PyMOL, and [`run_launch`] attaches to or starts PyMOL and
//! checks it answers. Both are written against generic streams and a
//! replaceable configuration loader so tests can drive them in-process.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use pymol_remote::{Acquired, Executor, connect_or_launch};
use pymol_remote_config::Config;
use tracing::info;

mod cli;
mod config;
mod errors;
mod telemetry;

use cli::{CmdCli, LaunchCli};
use config::{command_arguments, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
pub use telemetry::TelemetryError;

/// Connection timeout used by `pymol-cmd`.
const CMD_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Code run by `pymol-launch` to confirm the session answers.
const SMOKE_TEST: &str = "print('Claude connected!')";

/// Output that `pymol-cmd` does not echo.
const SILENT_OUTPUT: &str = "OK";

/// Bundles the output streams handed to the runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

/// Runs `pymol-cmd` with the given arguments and streams.
#[must_use]
pub fn run_cmd<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_cmd_with_loader(args, stdin, &mut io, &OrthoConfigLoader)
}

/// Runs `pymol-launch` with the given arguments and streams.
#[must_use]
pub fn run_launch<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_launch_with_loader(args, &mut io, &OrthoConfigLoader)
}

pub(crate) fn run_cmd_with_loader<I, R, W, E, L>(
    args: I,
    stdin: &mut R,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let result = parse_invocation::<CmdCli, L>(&args, loader)
        .and_then(|(cli, config)| send_code(&cli, &config, stdin, io));
    finish(result, io)
}

pub(crate) fn run_launch_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let result = parse_invocation::<LaunchCli, L>(&args, loader)
        .and_then(|(cli, config)| acquire_session(&cli, &config, io));
    finish(result, io)
}

/// Parses the tool's own arguments, loads configuration from the leading
/// configuration flags and initialises telemetry.
fn parse_invocation<C, L>(args: &[OsString], loader: &L) -> Result<(C, Config), AppError>
where
    C: Parser,
    L: ConfigLoader,
{
    let split = split_config_arguments(args);
    let cli = C::try_parse_from(command_arguments(args, &split)).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;
    Ok((cli, config))
}

fn send_code<R, W, E>(
    cli: &CmdCli,
    config: &Config,
    stdin: &mut R,
    io: &mut IoStreams<'_, W, E>,
) -> Result<(), AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let code = resolve_code(cli, stdin)?;
    let mut executor = Executor::from_config(config);
    executor
        .session_mut()
        .connect(CMD_CONNECT_TIMEOUT)
        .map_err(AppError::Connect)?;
    let output = executor.execute(&code)?;
    if !output.is_empty() && output != SILENT_OUTPUT {
        writeln!(io.stdout, "{output}").map_err(AppError::Output)?;
    }
    io.stdout.flush().map_err(AppError::Output)
}

fn resolve_code<R: Read>(cli: &CmdCli, stdin: &mut R) -> Result<String, AppError> {
    let code = if cli.reads_stdin() {
        let mut buffer = String::new();
        stdin
            .read_to_string(&mut buffer)
            .map_err(AppError::ReadStdin)?;
        buffer.trim().to_owned()
    } else {
        cli.code.join(" ").trim().to_owned()
    };
    if code.is_empty() {
        return Err(AppError::MissingCode);
    }
    Ok(code)
}

fn acquire_session<W, E>(
    cli: &LaunchCli,
    config: &Config,
    io: &mut IoStreams<'_, W, E>,
) -> Result<(), AppError>
where
    W: Write,
    E: Write,
{
    let Acquired {
        mut executor,
        process,
    } = connect_or_launch(config, cli.file.as_deref()).map_err(AppError::Acquire)?;
    let banner = if process.is_some() {
        "Launched new PyMOL session"
    } else {
        "Connected to existing PyMOL session"
    };
    writeln!(io.stdout, "{banner}").map_err(AppError::Output)?;

    let result = executor.execute(SMOKE_TEST)?;
    writeln!(io.stdout, "PyMOL ready: {}", result.trim_end()).map_err(AppError::Output)?;
    if let Some(process) = process {
        info!(pid = process.id(), "leaving PyMOL running");
    }
    io.stdout.flush().map_err(AppError::Output)
}

fn finish<W: Write, E: Write>(result: Result<(), AppError>, io: &mut IoStreams<'_, W, E>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) if error.is_informational() => {
            let _ = write!(io.stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(io.stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
