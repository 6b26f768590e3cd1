// src/job/state.rs - Job states and the operations each state enables
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::watch;

use super::progress::ProgressStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Ready,
    Plotting,
    Paused,
    Calibrating,
    Finished,
}

impl JobState {
    pub const ALL: [JobState; 6] = [
        JobState::Idle,
        JobState::Ready,
        JobState::Plotting,
        JobState::Paused,
        JobState::Calibrating,
        JobState::Finished,
    ];

    /// Human readable label used in the status line.
    pub fn label(self) -> &'static str {
        match self {
            JobState::Idle => "Idle",
            JobState::Ready => "Ready to Plot",
            JobState::Plotting => "Plotting",
            JobState::Paused => "Plot Paused",
            JobState::Calibrating => "Calibrating Home Position",
            JobState::Finished => "Plot Finished",
        }
    }

    /// Operations the operator may trigger while in this state.
    pub fn available_operations(self) -> &'static [Operation] {
        use Operation::*;
        match self {
            JobState::Idle => &[LoadScript],
            JobState::Ready => &[StartPlot, Calibrate, Quit],
            JobState::Plotting => &[Pause],
            JobState::Paused => &[StartPlot, Calibrate, Quit],
            JobState::Calibrating => &[
                JogPlusX,
                JogMinusX,
                JogPlusY,
                JogMinusY,
                AlignmentPlot,
                Continue,
            ],
            JobState::Finished => &[Quit],
        }
    }

    pub fn allows(self, operation: Operation) -> bool {
        self.available_operations().contains(&operation)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier of an operator operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    LoadScript,
    StartPlot,
    Quit,
    Calibrate,
    Continue,
    JogPlusX,
    JogMinusX,
    JogPlusY,
    JogMinusY,
    AlignmentPlot,
    Pause,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::LoadScript,
        Operation::StartPlot,
        Operation::Quit,
        Operation::Calibrate,
        Operation::Continue,
        Operation::JogPlusX,
        Operation::JogMinusX,
        Operation::JogPlusY,
        Operation::JogMinusY,
        Operation::AlignmentPlot,
        Operation::Pause,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Operation::LoadScript => "load-script",
            Operation::StartPlot => "start-plot",
            Operation::Quit => "quit",
            Operation::Calibrate => "calibrate",
            Operation::Continue => "continue",
            Operation::JogPlusX => "jog-plus-x",
            Operation::JogMinusX => "jog-minus-x",
            Operation::JogPlusY => "jog-plus-y",
            Operation::JogMinusY => "jog-minus-y",
            Operation::AlignmentPlot => "alignment-plot",
            Operation::Pause => "pause",
        }
    }

    /// Button label shown to the operator.
    pub fn label(self) -> &'static str {
        match self {
            Operation::LoadScript => "Load Plot File",
            Operation::StartPlot => "Plot",
            Operation::Quit => "Quit",
            Operation::Calibrate => "Calibrate",
            Operation::Continue => "Continue",
            Operation::JogPlusX => "+x",
            Operation::JogMinusX => "-x",
            Operation::JogPlusY => "+y",
            Operation::JogMinusY => "-y",
            Operation::AlignmentPlot => "Alignment Plot",
            Operation::Pause => "Pause",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.id() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Owner of the current [`JobState`].
///
/// The machine never rejects a transition; callers are only handed the
/// operations that [`JobState::available_operations`] lists for the current
/// state. Each transition is published to subscribers.
#[derive(Debug)]
pub struct JobStateMachine {
    state: JobState,
    publisher: watch::Sender<JobState>,
}

impl JobStateMachine {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(JobState::Idle);
        Self {
            state: JobState::Idle,
            publisher,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn transition(&mut self, next: JobState) {
        if self.state != next {
            tracing::info!(from = ?self.state, to = ?next, "Job state transition");
        }
        self.state = next;
        self.publisher.send_replace(next);
    }

    pub fn available_operations(&self) -> &'static [Operation] {
        self.state.available_operations()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.publisher.subscribe()
    }

    /// Status line, with a progress line once a script with commands is loaded.
    pub fn status_text(&self, progress: &ProgressStats) -> String {
        let mut content = format!("Status: {}", self.state.label());
        if let Some(pct) = progress.completed_percentage() {
            content.push_str(&format!(
                "\nProgress: {}% ({}/{})",
                pct,
                progress.completed(),
                progress.total()
            ));
        }
        content
    }
}

impl Default for JobStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
