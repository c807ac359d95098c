//! Environment guards shared by the configuration tests.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises environment mutation and restores the previous values on drop.
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub fn acquire() -> Self {
        let lock = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Self {
            saved: Vec::new(),
            _lock: lock,
        }
    }

    pub fn set(&mut self, key: &'static str, value: impl AsRef<OsStr>) {
        self.remember(key);
        // Environment mutation is unsafe on edition 2024; the mutex keeps it
        // single-threaded within this test binary.
        unsafe { std::env::set_var(key, value) };
    }

    pub fn remove(&mut self, key: &'static str) {
        self.remember(key);
        unsafe { std::env::remove_var(key) };
    }

    fn remember(&mut self, key: &'static str) {
        if self.saved.iter().all(|(saved, _)| *saved != key) {
            self.saved.push((key, std::env::var_os(key)));
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

/// Variables that could leak into a test from the caller's shell.
pub const CONFIG_VARIABLES: &[&str] = &[
    "PYMOL_REMOTE_CONFIG_PATH",
    "PYMOL_REMOTE_HOST",
    "PYMOL_REMOTE_PORT",
    "PYMOL_REMOTE_IO_TIMEOUT_MS",
    "PYMOL_REMOTE_LOG_FILTER",
];

/// Acquires the guard with every known configuration variable cleared.
pub fn clean_environment() -> EnvGuard {
    let mut guard = EnvGuard::acquire();
    for key in CONFIG_VARIABLES {
        guard.remove(key);
    }
    guard
}
