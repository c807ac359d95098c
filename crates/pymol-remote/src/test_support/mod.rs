//! Helpers for exercising the client against a scripted plugin.

mod fake_plugin;

pub use fake_plugin::{FakePlugin, Reply};
