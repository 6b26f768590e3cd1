//! Operator console and job engine for a remote pen-plotter service.
//!
//! A plot script is parsed into three sections, initialized on the remote
//! service, then drained one command at a time by a background dispatch loop
//! that the operator can pause, calibrate and cancel.

pub mod config;
pub mod director;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod notify;
pub mod script;
pub mod service;
pub mod web;

pub use config::{Config, ConfigError, load_config};
pub use director::{Action, PlotDirector};
pub use dispatcher::{CommandDispatcher, DispatchTiming};
pub use error::DirectorError;
pub use job::{ConsoleSnapshot, JobState, Operation, ProgressStats};
pub use script::{PlotScript, ScriptError};
pub use service::{PlotService, ServiceConnector, ServiceError};
