//! Operator HTTP API.
//! Handlers never touch the director directly; every request goes through the
//! console channel and is served by a single task.

pub mod api;
pub mod console_channel;
pub mod models;
