//! Behavioural tests against the scripted fake plugin.

mod executor_behaviour;
mod support;
