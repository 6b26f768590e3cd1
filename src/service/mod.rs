//! Client side of the remote plot service.
//!
//! The director only talks to the plotter through [`PlotService`]. A
//! [`ServiceConnector`] hands out one client handle per job; the handle is
//! created when a script is loaded and dropped when the job is cleared.

pub mod protocol;
pub mod sim;
pub mod tcp;

pub use sim::{SimulatedConnector, SimulatedPlotService};
pub use tcp::{TcpConnector, TcpPlotService};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of a service call that reached the device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// A call that did not produce a [`CommandResponse`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("plot service unavailable: {0}")]
    Unavailable(String),
    /// The service is up but lost its link to the device.
    #[error("device link fault: {0}")]
    DeviceLink(String),
    /// Malformed or unexpected reply.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ServiceError {
    /// Operator-facing advice for this failure.
    pub fn hint(&self, operation: &str) -> String {
        match self {
            ServiceError::DeviceLink(_) => "Check device connection".to_string(),
            ServiceError::Unavailable(_) => "Check plot service is running".to_string(),
            ServiceError::Protocol(_) => format!("{} failed", operation),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RPC surface of the remote plot service.
#[async_trait]
pub trait PlotService: Send + Sync {
    async fn initialize_plot(
        &self,
        options: &[String],
        definitions: &[String],
    ) -> Result<CommandResponse, ServiceError>;
    async fn has_power(&self) -> Result<bool, ServiceError>;
    async fn process_command(&self, command: &str) -> Result<CommandResponse, ServiceError>;
    async fn walk_home(&self, axis: Axis, distance: f32) -> Result<CommandResponse, ServiceError>;
    async fn plot_alignment_svg(&self) -> Result<CommandResponse, ServiceError>;
    async fn reset_home_position(&self) -> Result<CommandResponse, ServiceError>;
    async fn end_interactive_context(&self) -> Result<CommandResponse, ServiceError>;
    async fn restore_interactive_context(&self) -> Result<CommandResponse, ServiceError>;
    async fn disconnect(&self) -> Result<CommandResponse, ServiceError>;
}

/// Creates the client handle used for one job.
pub trait ServiceConnector: Send + Sync {
    fn connect(&self) -> Arc<dyn PlotService>;
}
