//! Job bookkeeping: the state machine, progress counters and operator logs.

pub mod log_buffer;
pub mod progress;
pub mod state;

pub use log_buffer::LogBuffer;
pub use progress::ProgressStats;
pub use state::{JobState, JobStateMachine, Operation, UnknownOperation};

use serde::Serialize;
use std::fmt;

use crate::config::LogConfig;
use crate::script::PlotScript;

/// Prefix of an operator-visible problem report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

/// Everything the console shows, guarded by a single lock.
#[derive(Debug)]
pub struct ConsoleState {
    pub machine: JobStateMachine,
    pub progress: ProgressStats,
    pub messages: LogBuffer,
    pub commands: LogBuffer,
    pub script: Option<PlotScript>,
}

impl ConsoleState {
    pub fn new(logs: &LogConfig) -> Self {
        Self {
            machine: JobStateMachine::new(),
            progress: ProgressStats::default(),
            messages: LogBuffer::new(logs.message_log_size),
            commands: LogBuffer::new(logs.command_log_size),
            script: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.machine.state()
    }

    pub fn transition(&mut self, next: JobState) {
        self.machine.transition(next);
    }

    pub fn status_text(&self) -> String {
        self.machine.status_text(&self.progress)
    }

    pub fn log_message(&mut self, message: &str) {
        self.messages.push(message);
    }

    /// Log `message` prefixed with its severity, to both the operator log and tracing.
    pub fn log_status(&mut self, message: &str, severity: Severity) {
        let line = format!("{}: {}", severity, message);
        match severity {
            Severity::Error => tracing::error!("{}", line),
            Severity::Warning => tracing::warn!("{}", line),
        }
        self.messages.push(line);
    }

    pub fn log_command(&mut self, command: &str) {
        self.commands.push(command);
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        let state = self.state();
        ConsoleSnapshot {
            state,
            label: state.label().to_string(),
            status: self.status_text(),
            progress: ProgressView {
                completed: self.progress.completed(),
                total: self.progress.total(),
                percentage: self.progress.completed_percentage(),
            },
            operations: state.available_operations().to_vec(),
            messages: self.messages.to_vec(),
            commands: self.commands.to_vec(),
            message_text: self.messages.rendered().to_string(),
            command_text: self.commands.rendered().to_string(),
            remaining_commands: self.script.as_ref().map_or(0, PlotScript::remaining_len),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub completed: usize,
    pub total: usize,
    pub percentage: Option<usize>,
}

/// Point-in-time copy of the console for observers.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleSnapshot {
    pub state: JobState,
    pub label: String,
    pub status: String,
    pub progress: ProgressView,
    pub operations: Vec<Operation>,
    pub messages: Vec<String>,
    pub commands: Vec<String>,
    pub message_text: String,
    pub command_text: String,
    pub remaining_commands: usize,
}
