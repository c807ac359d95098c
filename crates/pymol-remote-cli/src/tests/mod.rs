//! In-process tests for the command-line runtime.

mod cmd_behaviour;
mod support;
