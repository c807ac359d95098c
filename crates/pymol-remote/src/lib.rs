//! Remote control of a running PyMOL instance.
//!
//! The crate drives PyMOL through a control plugin that listens on a local
//! TCP port. It is layered leaf first:
//!
//! - [`session`] owns one socket and exchanges single request/response pairs.
//! - [`executor`] retries connection failures and interprets responses.
//! - [`launcher`] finds the PyMOL executable, starts it with the plugin
//!   preloaded and waits for the socket to accept connections.
//! - [`acquire`] attaches to a running instance or launches one.
//!
//! All I/O is blocking and single threaded. Exactly one request is in flight
//! per [`Session`]; `&mut self` on every exchange enforces that at compile
//! time.

pub mod acquire;
mod error;
pub mod executor;
pub mod launcher;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use acquire::{AcquireError, Acquired, connect_or_launch, connect_or_launch_with};
pub use error::ErrorKind;
pub use executor::{ExecuteError, Executor, RetryPolicy};
pub use launcher::{LaunchError, LaunchedProcess, Launcher, is_installed, locate_executable};
pub use pymol_remote_config::{Config, Endpoint};
pub use session::{Session, SessionError, SessionSettings, SessionState};

#[cfg(test)]
mod tests;
