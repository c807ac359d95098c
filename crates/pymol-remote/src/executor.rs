//! Command executor: retries connection failures and interprets responses.

use std::thread;
use std::time::Duration;

use pymol_remote_config::{Config, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS};
use pymol_remote_protocol::{Outcome, Request, Response};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::session::{Session, SessionError, SessionSettings};

const EXECUTOR_TARGET: &str = "pymol_remote::executor";

/// How often and how patiently the executor retries connection failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per command, including the first. Values below one are
    /// treated as one.
    pub attempts: u32,
    /// Sleep between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl From<&Config> for RetryPolicy {
    fn from(config: &Config) -> Self {
        Self {
            attempts: config.retry_attempts,
            backoff: config.retry_backoff(),
        }
    }
}

/// Errors raised by [`Executor::execute`].
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Every attempt failed with a connection-class error.
    #[error("failed to reach PyMOL after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure of the last attempt.
        #[source]
        source: SessionError,
    },
    /// The response did not arrive in time. Not retried.
    #[error(transparent)]
    Timeout(SessionError),
    /// The plugin reported a failure; the text is passed through verbatim.
    #[error("{message}")]
    Remote {
        /// Error text reported by the plugin.
        message: String,
    },
    /// The reply could not be understood. Not retried.
    #[error(transparent)]
    Protocol(SessionError),
}

impl ExecuteError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RetriesExhausted { .. } => ErrorKind::Connection,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Remote { .. } => ErrorKind::RemoteExecution,
            Self::Protocol(_) => ErrorKind::Protocol,
        }
    }
}

/// Runs code remotely through a [`Session`], reconnecting as needed.
#[derive(Debug)]
pub struct Executor {
    session: Session,
    policy: RetryPolicy,
}

impl Executor {
    /// Wraps an existing session.
    #[must_use]
    pub const fn new(session: Session, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    /// Builds a disconnected executor from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Session::new(SessionSettings::from(config)),
            RetryPolicy::from(config),
        )
    }

    /// Retry policy in force.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Underlying session, mutably.
    pub const fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Releases the underlying session.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Runs `code` in PyMOL and returns its captured output.
    ///
    /// Each attempt reconnects when the liveness probe fails, then exchanges
    /// one request. Connection-class failures are retried after the policy's
    /// back-off until the attempts run out.
    ///
    /// # Errors
    ///
    /// - [`ExecuteError::RetriesExhausted`] once every attempt failed to reach
    ///   the plugin.
    /// - [`ExecuteError::Timeout`] as soon as a response is overdue.
    /// - [`ExecuteError::Remote`] when the plugin reports failure.
    /// - [`ExecuteError::Protocol`] when the reply is not a valid response.
    pub fn execute(&mut self, code: &str) -> Result<String, ExecuteError> {
        let request = Request::execute(code);
        match self.exchange_with_retry(&request)?.into_outcome() {
            Outcome::Success(output) => Ok(output),
            Outcome::Failure(message) => {
                debug!(
                    target: EXECUTOR_TARGET,
                    error = %message,
                    "PyMOL reported failure"
                );
                Err(ExecuteError::Remote { message })
            }
        }
    }

    fn exchange_with_retry(&mut self, request: &Request) -> Result<Response, ExecuteError> {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;
        loop {
            let error = match self.attempt(request) {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            match error.kind() {
                ErrorKind::Connection if attempt < attempts => {
                    warn!(
                        target: EXECUTOR_TARGET,
                        attempt,
                        attempts,
                        error = %error,
                        "attempt failed; retrying"
                    );
                    thread::sleep(self.policy.backoff);
                    attempt += 1;
                }
                ErrorKind::Connection => {
                    return Err(ExecuteError::RetriesExhausted {
                        attempts,
                        source: error,
                    });
                }
                ErrorKind::Timeout => return Err(ExecuteError::Timeout(error)),
                _ => return Err(ExecuteError::Protocol(error)),
            }
        }
    }

    fn attempt(&mut self, request: &Request) -> Result<Response, SessionError> {
        if !self.session.is_connected() {
            let timeout = self.session.settings().connect_timeout;
            self.session.connect(timeout)?;
        }
        self.session.send_receive(request)
    }
}
