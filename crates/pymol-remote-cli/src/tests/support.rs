//! Harness for driving the runtime against the fake plugin.

use std::ffi::OsString;
use std::net::TcpListener;
use std::process::ExitCode;

use pymol_remote::test_support::{FakePlugin, Reply};
use pymol_remote_config::Config;

use crate::{AppError, ConfigLoader, IoStreams, run_cmd_with_loader, run_launch_with_loader};

/// A config loader that returns a fixed configuration for tests.
pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Test world holding configuration, the fake plugin and captured output.
#[derive(Default)]
pub(super) struct TestWorld {
    pub config: Config,
    pub plugin: Option<FakePlugin>,
    pub stdin: Vec<u8>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
}

impl TestWorld {
    pub fn with_plugin(script: impl IntoIterator<Item = Reply>) -> Self {
        let plugin = FakePlugin::spawn(script).expect("spawn fake plugin");
        Self {
            config: plugin.config(),
            plugin: Some(plugin),
            ..Self::default()
        }
    }

    pub fn without_plugin() -> Self {
        let port = {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral port");
            listener.local_addr().expect("local addr").port()
        };
        let config = Config {
            host: String::from("127.0.0.1"),
            port,
            probe_timeout_ms: 200,
            ..Config::default()
        };
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn run_cmd(&mut self, args: &[&str]) {
        self.reset_output();
        let loader = StaticConfigLoader::new(self.config.clone());
        let mut stdin = self.stdin.as_slice();
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        self.exit_code = Some(run_cmd_with_loader(
            Self::build_args("pymol-cmd", args),
            &mut stdin,
            &mut io,
            &loader,
        ));
    }

    pub fn run_launch(&mut self, args: &[&str]) {
        self.reset_output();
        let loader = StaticConfigLoader::new(self.config.clone());
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        self.exit_code = Some(run_launch_with_loader(
            Self::build_args("pymol-launch", args),
            &mut io,
            &loader,
        ));
    }

    pub fn requests(&self) -> Vec<String> {
        self.plugin.as_ref().map(FakePlugin::requests).unwrap_or_default()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8(self.stdout.clone()).expect("stdout utf8")
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8(self.stderr.clone()).expect("stderr utf8")
    }

    pub fn assert_success(&self) {
        let exit = self.exit_code.expect("exit code recorded");
        assert_eq!(exit, ExitCode::SUCCESS, "stderr: {}", self.stderr_text());
    }

    pub fn assert_failure(&self) {
        let exit = self.exit_code.expect("exit code recorded");
        assert_eq!(exit, ExitCode::FAILURE, "stdout: {}", self.stdout_text());
    }

    fn reset_output(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
        self.exit_code = None;
    }

    fn build_args(program: &str, args: &[&str]) -> Vec<OsString> {
        std::iter::once(program)
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }
}
