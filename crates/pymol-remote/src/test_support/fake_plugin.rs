//! In-process stand-in for the PyMOL control plugin.
//!
//! Listens on an ephemeral loopback port, serves one connection at a time,
//! and answers each complete request with the next scripted [`Reply`]. Once
//! the script runs out, every further request is read and the connection is
//! closed without an answer.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use pymol_remote_config::{Config, Endpoint};
use pymol_remote_protocol::{Decoded, FrameDecoder, Request};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What the fake plugin does after reading one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Writes the text and keeps the connection open.
    Respond(String),
    /// Writes the pieces one at a time with a pause between them.
    RespondInChunks {
        /// Pieces written in order.
        chunks: Vec<String>,
        /// Pause after each piece.
        delay: Duration,
    },
    /// Writes the text, then closes the connection.
    RespondThenClose(String),
    /// Closes the connection without answering.
    CloseWithoutReply,
    /// Holds the connection open without answering, then closes it.
    Stall(Duration),
}

impl Reply {
    /// A success response carrying `output`.
    #[must_use]
    pub fn success(output: &str) -> Self {
        Self::Respond(serde_json::json!({ "status": "success", "output": output }).to_string())
    }

    /// A failure response carrying `error`.
    #[must_use]
    pub fn failure(error: &str) -> Self {
        Self::Respond(serde_json::json!({ "status": "error", "error": error }).to_string())
    }
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<String>>,
    connections: AtomicUsize,
    accepted: Mutex<Vec<Instant>>,
    stop: AtomicBool,
}

impl Shared {
    fn stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Option<Reply> {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn record_accept(&self) {
        self.connections.fetch_add(1, Ordering::SeqCst);
        self.accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());
    }

    fn record(&self, code: String) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(code);
    }
}

/// Scripted plugin server running on a background thread.
#[derive(Debug)]
pub struct FakePlugin {
    port: u16,
    shared: Arc<Shared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakePlugin {
    /// Starts a server that answers requests with `script`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot be bound.
    pub fn spawn(script: impl IntoIterator<Item = Reply>) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        Self::serve(listener, script)
    }

    /// Starts a server that reads requests and never answers them.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot be bound.
    pub fn unanswered() -> io::Result<Self> {
        Self::spawn(Vec::<Reply>::new())
    }

    /// Starts a server on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot be switched to
    /// non-blocking mode.
    pub fn serve(listener: TcpListener, script: impl IntoIterator<Item = Reply>) -> io::Result<Self> {
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();
        let shared = Arc::new(Shared {
            script: Mutex::new(script.into_iter().collect()),
            ..Shared::default()
        });
        let worker = Arc::clone(&shared);
        let handle = thread::spawn(move || accept_loop(&listener, &worker));
        Ok(Self {
            port,
            shared,
            handle: Some(handle),
        })
    }

    /// Port the server listens on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Loopback endpoint of the server.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port)
    }

    /// Default configuration pointed at this server with short timings.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            connect_timeout_ms: 1_000,
            io_timeout_ms: 2_000,
            probe_timeout_ms: 500,
            ..Config::default()
        }
        .with_endpoint(&self.endpoint())
    }

    /// Code of every request read so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Connections accepted so far.
    #[must_use]
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// When each connection was accepted, in order.
    #[must_use]
    pub fn accept_times(&self) -> Vec<Instant> {
        self.shared
            .accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for FakePlugin {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            drop(handle.join());
        }
    }
}

fn accept_loop(listener: &TcpListener, shared: &Shared) {
    while !shared.stopping() {
        match listener.accept() {
            Ok((stream, _)) => {
                shared.record_accept();
                if let Err(error) = serve_connection(stream, shared) {
                    debug!(error = %error, "fake plugin dropped connection");
                }
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(_) => return,
        }
    }
}

fn serve_connection(mut stream: TcpStream, shared: &Shared) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(POLL_INTERVAL))?;
    loop {
        let Some(code) = read_request(&mut stream, shared)? else {
            return Ok(());
        };
        shared.record(code);
        match shared.next_reply() {
            Some(Reply::Respond(text)) => write_all(&mut stream, &text)?,
            Some(Reply::RespondInChunks { chunks, delay }) => {
                for chunk in chunks {
                    write_all(&mut stream, &chunk)?;
                    thread::sleep(delay);
                }
            }
            Some(Reply::RespondThenClose(text)) => {
                write_all(&mut stream, &text)?;
                return close(&stream);
            }
            Some(Reply::Stall(duration)) => {
                pause(duration, shared);
                return close(&stream);
            }
            Some(Reply::CloseWithoutReply) | None => return close(&stream),
        }
    }
}

/// Reads one complete request; `None` once the client goes away or the
/// server is stopping.
fn read_request(stream: &mut TcpStream, shared: &Shared) -> io::Result<Option<String>> {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0_u8; 1024];
    while !shared.stopping() {
        let read = match stream.read(&mut chunk) {
            Ok(0) => return Ok(None),
            Ok(read) => read,
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(error) => return Err(error),
        };
        decoder.extend(chunk.get(..read).unwrap_or_default());
        match decoder.decode::<Request>() {
            Ok(Decoded::Complete { message, .. }) => return Ok(Some(message.code().to_owned())),
            Ok(Decoded::Incomplete) => {}
            Err(error) => return Err(io::Error::new(io::ErrorKind::InvalidData, error)),
        }
    }
    Ok(None)
}

fn write_all(stream: &mut TcpStream, text: &str) -> io::Result<()> {
    stream.write_all(text.as_bytes())?;
    stream.flush()
}

fn close(stream: &TcpStream) -> io::Result<()> {
    match stream.shutdown(Shutdown::Both) {
        Err(error) if error.kind() != io::ErrorKind::NotConnected => Err(error),
        _ => Ok(()),
    }
}

fn pause(duration: Duration, shared: &Shared) {
    let deadline = Instant::now() + duration;
    while !shared.stopping() && Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
    }
}
