//! Shared fixtures for the behavioural tests.

use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use camino::Utf8PathBuf;
use pymol_remote_config::Config;

use crate::session::{Session, SessionSettings};
use crate::test_support::FakePlugin;

/// Lets a peer-side close reach our socket before probing it.
pub(super) fn settle() {
    thread::sleep(Duration::from_millis(100));
}

/// A port that nothing listens on at the time of the call.
pub(super) fn unused_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// A connected session to `plugin`.
pub(super) fn connected_session(plugin: &FakePlugin) -> Session {
    let mut session = Session::new(SessionSettings::from(&plugin.config()));
    session
        .connect(Duration::from_secs(1))
        .expect("connect to fake plugin");
    session
}

/// Configuration with fast timings and no retry back-off.
pub(super) fn fast_config(port: u16) -> Config {
    Config {
        host: String::from("127.0.0.1"),
        port,
        connect_timeout_ms: 500,
        io_timeout_ms: 1_000,
        probe_timeout_ms: 200,
        launch_timeout_ms: 5_000,
        poll_interval_ms: 50,
        retry_backoff_ms: 0,
        ..Config::default()
    }
}

pub(super) fn utf8(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf-8 temp path")
}

/// Writes an executable shell script standing in for PyMOL.
#[cfg(unix)]
pub(super) fn write_fake_pymol(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("pymol");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake pymol");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake pymol");
    path
}

/// Writes an empty control plugin script.
pub(super) fn write_plugin(dir: &Path) -> PathBuf {
    let path = dir.join(crate::launcher::PLUGIN_FILE_NAME);
    fs::write(&path, "# control plugin\n").expect("write plugin");
    path
}
