//! Behaviour of `pymol-cmd`.

use pymol_remote::test_support::Reply;
use rstest::rstest;

use super::support::TestWorld;
use crate::errors::CONNECTION_HINT;

#[rstest]
fn prints_command_output() {
    let mut world = TestWorld::with_plugin([Reply::success("2")]);

    world.run_cmd(&["print(1+1)"]);

    world.assert_success();
    assert_eq!(world.stdout_text(), "2\n");
    assert_eq!(world.requests(), vec![String::from("print(1+1)")]);
}

#[rstest]
fn joins_arguments_with_spaces() {
    let mut world = TestWorld::with_plugin([Reply::success("")]);

    world.run_cmd(&["cmd.fetch('1ubq');", "cmd.show('cartoon')"]);

    world.assert_success();
    assert_eq!(
        world.requests(),
        vec![String::from("cmd.fetch('1ubq'); cmd.show('cartoon')")]
    );
}

#[rstest]
#[case::empty("")]
#[case::ok("OK")]
fn suppresses_uninformative_output(#[case] output: &str) {
    let mut world = TestWorld::with_plugin([Reply::success(output)]);

    world.run_cmd(&["cmd.zoom()"]);

    world.assert_success();
    assert!(world.stdout.is_empty());
}

#[rstest]
fn reads_trimmed_code_from_stdin() {
    let mut world = TestWorld::with_plugin([Reply::success("3")]);
    world.stdin = b"\n  print(len(cmd.get_names()))  \n".to_vec();

    world.run_cmd(&["-"]);

    world.assert_success();
    assert_eq!(
        world.requests(),
        vec![String::from("print(len(cmd.get_names()))")]
    );
}

#[rstest]
#[case::no_arguments(&[])]
#[case::blank_argument(&["   "])]
#[case::empty_stdin(&["-"])]
fn missing_code_prints_usage(#[case] args: &[&str]) {
    let mut world = TestWorld::with_plugin(Vec::<Reply>::new());

    world.run_cmd(args);

    world.assert_failure();
    assert!(world.stderr_text().starts_with("Usage: pymol-cmd"));
    assert!(world.requests().is_empty());
}

#[rstest]
fn remote_failure_is_reported() {
    let mut world = TestWorld::with_plugin([Reply::failure("NameError: x")]);

    world.run_cmd(&["x"]);

    world.assert_failure();
    assert_eq!(world.stderr_text(), "PyMOL error: NameError: x\n");
    assert!(world.stdout.is_empty());
}

#[rstest]
fn unreachable_plugin_prints_hint() {
    let mut world = TestWorld::without_plugin();

    world.run_cmd(&["print(1)"]);

    world.assert_failure();
    let stderr = world.stderr_text();
    assert!(stderr.starts_with("Connection error: "), "stderr: {stderr}");
    assert!(stderr.contains(CONNECTION_HINT));
}

#[rstest]
fn help_goes_to_stdout() {
    let mut world = TestWorld::without_plugin();

    world.run_cmd(&["--help"]);

    world.assert_success();
    assert!(world.stdout_text().contains("pymol-cmd"));
    assert!(world.stderr.is_empty());
}
