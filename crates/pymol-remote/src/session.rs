//! Transport session: one TCP socket to the control plugin.
//!
//! A [`Session`] is either disconnected or holds exactly one open stream.
//! Every failure during an exchange drops the stream, so a reply that arrives
//! late is never read as the answer to the next request.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use pymol_remote_config::{Config, Endpoint};
use pymol_remote_protocol::{Decoded, FrameDecoder, FrameError, Request, Response};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::error::{ErrorKind, millis};

const SESSION_TARGET: &str = "pymol_remote::session";

/// Size of each socket read while waiting for a response.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Connection parameters for a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Address of the control plugin.
    pub endpoint: Endpoint,
    /// Timeout used by [`crate::Executor`] when it reconnects.
    pub connect_timeout: Duration,
    /// Read and write timeout applied once connected. Zero disables it.
    pub io_timeout: Duration,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint(),
            connect_timeout: config.connect_timeout(),
            io_timeout: config.io_timeout(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No socket is open.
    Disconnected,
    /// A socket is open; the peer may still have gone away.
    Connected,
}

/// Errors raised by [`Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Opening the connection failed.
    #[error("failed to connect to PyMOL at {endpoint}: {source}")]
    Connect {
        /// Target address.
        endpoint: String,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },
    /// An exchange was attempted without an open socket.
    #[error("not connected to PyMOL")]
    NotConnected,
    /// The peer closed the socket before a complete response arrived.
    #[error("PyMOL at {endpoint} closed the connection after {received} bytes of response")]
    PeerClosed {
        /// Peer address.
        endpoint: String,
        /// Bytes buffered before the close.
        received: usize,
    },
    /// A read or write failed.
    #[error("socket error talking to PyMOL at {endpoint}: {source}")]
    Io {
        /// Peer address.
        endpoint: String,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },
    /// A read or write exceeded the I/O timeout.
    #[error("timed out after {timeout_ms} ms waiting for PyMOL at {endpoint}")]
    Timeout {
        /// Peer address.
        endpoint: String,
        /// Configured I/O timeout.
        timeout_ms: u64,
    },
    /// The request could not be serialised.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    /// The peer sent bytes that can never form a valid response.
    #[error("malformed response from PyMOL at {endpoint}: {source}")]
    Malformed {
        /// Peer address.
        endpoint: String,
        /// Decoder failure.
        #[source]
        source: FrameError,
    },
}

impl SessionError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } | Self::NotConnected | Self::PeerClosed { .. } | Self::Io { .. } => {
                ErrorKind::Connection
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Encode(_) | Self::Malformed { .. } => ErrorKind::Protocol,
        }
    }
}

/// A single socket session with the control plugin.
#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    stream: Option<TcpStream>,
}

impl Session {
    /// Creates a disconnected session.
    #[must_use]
    pub const fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            stream: None,
        }
    }

    /// Address this session talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.settings.endpoint
    }

    /// Connection parameters.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Current state, without probing the peer.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.stream.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Opens the socket unless one is already open.
    ///
    /// Every address the host resolves to is tried in turn, each bounded by
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connect`] when no address accepts the
    /// connection; the session stays disconnected.
    pub fn connect(&mut self, timeout: Duration) -> Result<(), SessionError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let endpoint = &self.settings.endpoint;
        let stream = open_stream(endpoint, timeout)
            .and_then(|stream| {
                apply_io_timeout(&stream, self.settings.io_timeout)?;
                Ok(stream)
            })
            .map_err(|source| {
                debug!(
                    target: SESSION_TARGET,
                    endpoint = %endpoint,
                    error = %source,
                    "connection attempt failed"
                );
                SessionError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                }
            })?;
        debug!(target: SESSION_TARGET, endpoint = %endpoint, "connected");
        self.stream = Some(stream);
        Ok(())
    }

    /// Closes the socket if open. Close-time errors are ignored.
    pub fn disconnect(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        if let Err(error) = stream.shutdown(Shutdown::Both) {
            trace!(
                target: SESSION_TARGET,
                error = %error,
                "ignoring shutdown error"
            );
        }
        debug!(
            target: SESSION_TARGET,
            endpoint = %self.settings.endpoint,
            "disconnected"
        );
    }

    /// Checks whether the peer is still there without consuming input.
    ///
    /// Peeks one byte in non-blocking mode. An orderly shutdown or a socket
    /// error disconnects the session and reports `false`; pending data or an
    /// empty but open socket reports `true`. This is a heuristic: the peer may
    /// vanish right after the check.
    pub fn is_connected(&mut self) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return false;
        };
        let mut alive = peek_alive(stream);
        if let Err(error) = restore_blocking(stream, self.settings.io_timeout) {
            debug!(
                target: SESSION_TARGET,
                error = %error,
                "failed to restore blocking mode after probe"
            );
            alive = false;
        }
        if !alive {
            debug!(
                target: SESSION_TARGET,
                endpoint = %self.settings.endpoint,
                "peer is gone"
            );
            self.disconnect();
        }
        alive
    }

    /// Sends one request and waits for its response.
    ///
    /// Reads in [`READ_CHUNK_SIZE`] chunks until the buffered bytes decode as
    /// one complete response. Anything after that response is discarded.
    ///
    /// # Errors
    ///
    /// Fails with a connection-class error when not connected, when the peer
    /// closes early or on socket faults; a timeout-class error when a read or
    /// write exceeds the I/O timeout; a protocol-class error when the reply is
    /// not a valid response. The session is disconnected after any failure,
    /// timeouts included, so the next exchange starts on a fresh connection
    /// and a late reply is never read as the answer to a later request.
    pub fn send_receive(&mut self, request: &Request) -> Result<Response, SessionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(SessionError::NotConnected);
        };
        let result = exchange(stream, &self.settings, request);
        if result.is_err() {
            self.disconnect();
        }
        result
    }
}

fn open_stream(endpoint: &Endpoint, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;
    for address in (endpoint.host.as_str(), endpoint.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&address, timeout) {
            Ok(stream) => return Ok(stream),
            Err(error) => {
                trace!(
                    target: SESSION_TARGET,
                    %address,
                    error = %error,
                    "address refused connection"
                );
                last_error = Some(error);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses")
    }))
}

fn apply_io_timeout(stream: &TcpStream, timeout: Duration) -> io::Result<()> {
    let timeout = (!timeout.is_zero()).then_some(timeout);
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)
}

fn peek_alive(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut byte = [0_u8; 1];
    match stream.peek(&mut byte) {
        Ok(0) => false,
        Ok(_) => true,
        Err(error) => matches!(
            error.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        ),
    }
}

fn restore_blocking(stream: &TcpStream, io_timeout: Duration) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    apply_io_timeout(stream, io_timeout)
}

fn exchange(
    stream: &mut TcpStream,
    settings: &SessionSettings,
    request: &Request,
) -> Result<Response, SessionError> {
    let payload = request.to_bytes().map_err(SessionError::Encode)?;
    stream
        .write_all(&payload)
        .and_then(|()| stream.flush())
        .map_err(|error| io_failure(error, settings))?;
    trace!(
        target: SESSION_TARGET,
        bytes = payload.len(),
        "request sent"
    );

    let mut decoder = FrameDecoder::new();
    let mut chunk = [0_u8; READ_CHUNK_SIZE];
    loop {
        let read = match stream.read(&mut chunk) {
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(io_failure(error, settings)),
        };
        if read == 0 {
            return Err(SessionError::PeerClosed {
                endpoint: settings.endpoint.to_string(),
                received: decoder.len(),
            });
        }
        decoder.extend(chunk.get(..read).unwrap_or_default());
        match decoder.decode::<Response>() {
            Ok(Decoded::Complete { message, trailing }) => {
                if trailing > 0 {
                    warn!(
                        target: SESSION_TARGET,
                        trailing,
                        "discarding bytes after complete response"
                    );
                }
                return Ok(message);
            }
            Ok(Decoded::Incomplete) => {
                trace!(
                    target: SESSION_TARGET,
                    buffered = decoder.len(),
                    "response incomplete; reading more"
                );
            }
            Err(source) => {
                return Err(SessionError::Malformed {
                    endpoint: settings.endpoint.to_string(),
                    source,
                });
            }
        }
    }
}

fn io_failure(error: io::Error, settings: &SessionSettings) -> SessionError {
    let endpoint = settings.endpoint.to_string();
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => SessionError::Timeout {
            endpoint,
            timeout_ms: millis(settings.io_timeout),
        },
        _ => SessionError::Io {
            endpoint,
            source: error,
        },
    }
}
