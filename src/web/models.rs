//! Request and response bodies of the operator API.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job::{ConsoleSnapshot, JobState, Operation, ProgressView};

/// An operation the operator can trigger right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationView {
    pub id: String,
    pub label: String,
}

impl From<Operation> for OperationView {
    fn from(operation: Operation) -> Self {
        Self {
            id: operation.id().to_string(),
            label: operation.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub state: JobState,
    pub label: String,
    pub status: String,
    pub progress: ProgressView,
    pub operations: Vec<OperationView>,
}

impl From<&ConsoleSnapshot> for StatusResponse {
    fn from(snapshot: &ConsoleSnapshot) -> Self {
        Self {
            state: snapshot.state,
            label: snapshot.label.clone(),
            status: snapshot.status.clone(),
            progress: snapshot.progress.clone(),
            operations: snapshot.operations.iter().copied().map(OperationView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsResponse {
    pub messages: Vec<String>,
    pub commands: Vec<String>,
    pub message_text: String,
    pub command_text: String,
}

impl From<ConsoleSnapshot> for LogsResponse {
    fn from(snapshot: ConsoleSnapshot) -> Self {
        Self {
            messages: snapshot.messages,
            commands: snapshot.commands,
            message_text: snapshot.message_text,
            command_text: snapshot.command_text,
        }
    }
}

/// Body of `POST /api/v1/operations/{id}`. Only `load-script` reads `path`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationRequest {
    #[serde(default)]
    pub path: Option<PathBuf>,
}
