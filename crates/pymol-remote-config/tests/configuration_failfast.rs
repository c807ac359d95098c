//! Invalid sources are reported instead of silently ignored.

mod support;

use std::ffi::OsString;
use std::fs;

use ortho_config::OrthoConfig as _;
use pymol_remote_config::Config;
use tempfile::TempDir;

use support::clean_environment;

#[test]
fn malformed_file_is_rejected() {
    let mut env = clean_environment();
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "port = not_a_number\n").expect("write malformed config");
    env.set("PYMOL_REMOTE_CONFIG_PATH", path.as_os_str());

    let error = Config::load_from_iter([OsString::from("pymol-cmd")])
        .expect_err("loading must fail");
    assert!(!error.to_string().is_empty());
}

#[test]
fn out_of_range_port_is_rejected() {
    let mut env = clean_environment();
    env.set("PYMOL_REMOTE_PORT", "70000");

    let result = Config::load_from_iter([OsString::from("pymol-cmd")]);
    assert!(result.is_err(), "port beyond u16 must fail, got {result:?}");
}
