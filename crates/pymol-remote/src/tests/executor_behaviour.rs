//! Retry policy and response interpretation.

use std::time::Duration;

use rstest::rstest;

use super::support::{fast_config, settle, unused_port};
use crate::ErrorKind;
use crate::executor::{ExecuteError, Executor, RetryPolicy};
use crate::session::{Session, SessionError, SessionSettings};
use crate::test_support::{FakePlugin, Reply};

fn executor_for(plugin: &FakePlugin) -> Executor {
    Executor::from_config(&plugin.config())
}

#[rstest]
fn success_yields_output() {
    let plugin = FakePlugin::spawn([Reply::success("2")]).expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    assert_eq!(executor.execute("1+1").expect("execute"), "2");
    assert_eq!(plugin.requests(), vec![String::from("1+1")]);
}

#[rstest]
fn failure_yields_plugin_error_text() {
    let plugin = FakePlugin::spawn([Reply::failure("NameError: x")]).expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    let error = executor.execute("x").expect_err("plugin reports failure");

    assert_eq!(error.kind(), ErrorKind::RemoteExecution);
    assert_eq!(error.to_string(), "NameError: x");
    assert_eq!(plugin.connections(), 1, "remote failures are not retried");
}

#[rstest]
#[case::missing_output(r#"{"status":"success"}"#, Ok(""))]
#[case::missing_error(r#"{"status":"error"}"#, Err("Unknown error"))]
#[case::missing_status(r#"{"output":"2"}"#, Err("Unknown error"))]
fn absent_fields_use_defaults(#[case] reply: &str, #[case] expected: Result<&str, &str>) {
    let plugin = FakePlugin::spawn([Reply::Respond(reply.to_owned())]).expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    let outcome = executor.execute("cmd.get_names()");

    match (outcome, expected) {
        (Ok(output), Ok(expected)) => assert_eq!(output, expected),
        (Err(error), Err(expected)) => {
            assert_eq!(error.kind(), ErrorKind::RemoteExecution);
            assert_eq!(error.to_string(), expected);
        }
        (outcome, expected) => panic!("expected {expected:?}, got {outcome:?}"),
    }
}

#[rstest]
#[case::numeric_status(r#"{"status":0,"error":"boom"}"#, "boom")]
#[case::boolean_status(r#"{"status":false,"error":"boom"}"#, "boom")]
#[case::structured_error(
    r#"{"status":"error","error":{"type":"NameError"}}"#,
    r#"{"type":"NameError"}"#
)]
fn loosely_typed_failures_are_remote_errors(#[case] reply: &str, #[case] expected: &str) {
    let plugin = FakePlugin::spawn([Reply::Respond(reply.to_owned())]).expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    let error = executor.execute("x").expect_err("plugin reports failure");

    assert_eq!(error.kind(), ErrorKind::RemoteExecution);
    assert_eq!(error.to_string(), expected);
    assert_eq!(plugin.requests().len(), 1);
}

#[rstest]
fn peer_closing_every_attempt_exhausts_retries() {
    let plugin = FakePlugin::unanswered().expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    let error = executor.execute("x").expect_err("peer never answers");

    assert!(
        matches!(error, ExecuteError::RetriesExhausted { attempts: 3, .. }),
        "unexpected error: {error:?}"
    );
    assert_eq!(error.kind(), ErrorKind::Connection);
    assert_eq!(plugin.requests().len(), 3);

    let accepted = plugin.accept_times();
    assert_eq!(accepted.len(), 3);
    for (earlier, later) in accepted.iter().zip(accepted.iter().skip(1)) {
        let gap = later.duration_since(*earlier);
        assert!(
            gap >= Duration::from_millis(500),
            "attempts only {gap:?} apart"
        );
    }
}

#[rstest]
fn unreachable_plugin_exhausts_retries_with_connect_cause() {
    let config = fast_config(unused_port());
    let mut executor = Executor::new(
        Session::new(SessionSettings::from(&config)),
        RetryPolicy {
            attempts: 2,
            backoff: Duration::from_millis(10),
        },
    );

    let error = executor.execute("x").expect_err("nothing listens");

    match error {
        ExecuteError::RetriesExhausted { attempts, source } => {
            assert_eq!(attempts, 2);
            assert!(matches!(source, SessionError::Connect { .. }));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[rstest]
fn timeout_is_not_retried() {
    let plugin = FakePlugin::spawn([Reply::Stall(Duration::from_secs(2))]).expect("spawn plugin");
    let mut config = plugin.config();
    config.io_timeout_ms = 200;
    let mut executor = Executor::from_config(&config);

    let error = executor.execute("slow()").expect_err("reply never arrives");

    assert!(matches!(error, ExecuteError::Timeout(_)), "unexpected error: {error:?}");
    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert_eq!(plugin.requests().len(), 1);
}

#[rstest]
fn malformed_reply_is_not_retried() {
    let plugin = FakePlugin::spawn([Reply::Respond(String::from("garbage"))]).expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    let error = executor.execute("x").expect_err("reply is malformed");

    assert!(matches!(error, ExecuteError::Protocol(_)));
    assert_eq!(error.kind(), ErrorKind::Protocol);
    assert_eq!(plugin.requests().len(), 1);
}

#[rstest]
fn reconnects_after_idle_shutdown() {
    let plugin = FakePlugin::spawn([
        Reply::RespondThenClose(String::from(r#"{"status":"success","output":"first"}"#)),
        Reply::success("second"),
    ])
    .expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    assert_eq!(executor.execute("a").expect("first execute"), "first");
    settle();
    assert!(!executor.session_mut().is_connected());
    assert_eq!(executor.execute("b").expect("second execute"), "second");

    assert_eq!(plugin.connections(), 2);
    assert_eq!(plugin.requests(), vec![String::from("a"), String::from("b")]);
}

#[rstest]
fn session_is_reused_between_commands() {
    let plugin = FakePlugin::spawn([Reply::success("1"), Reply::success("2")]).expect("spawn plugin");
    let mut executor = executor_for(&plugin);

    assert_eq!(executor.execute("a").expect("first"), "1");
    assert_eq!(executor.execute("b").expect("second"), "2");
    assert_eq!(plugin.connections(), 1);
}
