//! Polling a freshly launched PyMOL until its control socket accepts
//! connections.

use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use pymol_remote_config::Endpoint;
use tracing::{debug, trace};

use super::LAUNCHER_TARGET;
use super::error::LaunchError;
use crate::error::millis;
use crate::session::{Session, SessionSettings};

/// Parameters for readiness polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ReadinessProbe {
    pub(super) endpoint: Endpoint,
    pub(super) probe_timeout: Duration,
    pub(super) poll_interval: Duration,
}

impl ReadinessProbe {
    /// Opens and immediately closes one connection.
    pub(super) fn probe_once(&self) -> bool {
        let mut session = Session::new(SessionSettings {
            endpoint: self.endpoint.clone(),
            connect_timeout: self.probe_timeout,
            io_timeout: self.probe_timeout,
        });
        let reachable = session.connect(self.probe_timeout).is_ok();
        session.disconnect();
        reachable
    }
}

/// Waits until the socket accepts a connection or `timeout` elapses.
///
/// A child that exits with a failure status ends the wait early. A child
/// that exits successfully may have handed off to another process, so
/// polling continues.
pub(super) fn wait_for_socket(
    child: &mut Child,
    probe: &ReadinessProbe,
    timeout: Duration,
) -> Result<(), LaunchError> {
    let deadline = Instant::now() + timeout;
    let mut handed_off = false;
    loop {
        if !handed_off {
            if let Some(status) = child
                .try_wait()
                .map_err(|source| LaunchError::Monitor { source })?
            {
                if !status.success() {
                    return Err(LaunchError::ExitedEarly { status });
                }
                debug!(
                    target: LAUNCHER_TARGET,
                    "launcher process exited cleanly; waiting for the socket"
                );
                handed_off = true;
            }
        }
        if probe.probe_once() {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(LaunchError::StartupTimeout {
                endpoint: probe.endpoint.to_string(),
                timeout_ms: millis(timeout),
            });
        }
        trace!(
            target: LAUNCHER_TARGET,
            endpoint = %probe.endpoint,
            "socket not ready"
        );
        thread::sleep(probe.poll_interval.min(deadline - now));
    }
}
