// src/error.rs - Errors returned by operator operations
use thiserror::Error;

use crate::job::{JobState, Operation, Severity};
use crate::script::ScriptError;
use crate::service::ServiceError;

#[derive(Debug, Error)]
pub enum DirectorError {
    /// Plot script could not be read.
    #[error("File error: {0}")]
    File(#[from] ScriptError),
    /// Plot service unreachable or its device link is down.
    #[error("Connectivity error: {0}")]
    Connectivity(#[from] ServiceError),
    /// Service reachable but the device reported a fault.
    #[error("Device error: {0}")]
    Device(String),
    /// The service answered with `success=false`.
    #[error("{0}")]
    Logic(String),
    #[error("Operation '{operation}' is not available while {state}")]
    NotAvailable { operation: Operation, state: JobState },
    #[error("Operation '{0}' requires an argument")]
    MissingArgument(Operation),
}

impl DirectorError {
    pub fn severity(&self) -> Severity {
        match self {
            DirectorError::Device(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}
