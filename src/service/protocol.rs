//! Newline-delimited JSON frames exchanged with the plot service.
//!
//! Request:  `{"id":7,"request":{"method":"process_command","params":{"command":"moveto 0 0"}}}`
//! Response: `{"id":7,"result":{"success":true,"message":""}}`
//! Failure:  `{"id":7,"error":{"code":"internal","message":"USB link lost"}}`

use serde::{Deserialize, Serialize};

use super::{Axis, ServiceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum ServiceRequest {
    InitializePlot {
        options: Vec<String>,
        definitions: Vec<String>,
    },
    HasPower,
    ProcessCommand {
        command: String,
    },
    WalkHome {
        axis: Axis,
        distance: f32,
    },
    PlotAlignmentSvg,
    ResetHomePosition,
    EndInteractiveContext,
    RestoreInteractiveContext,
    Disconnect,
}

impl ServiceRequest {
    pub fn method(&self) -> &'static str {
        match self {
            ServiceRequest::InitializePlot { .. } => "initialize_plot",
            ServiceRequest::HasPower => "has_power",
            ServiceRequest::ProcessCommand { .. } => "process_command",
            ServiceRequest::WalkHome { .. } => "walk_home",
            ServiceRequest::PlotAlignmentSvg => "plot_alignment_svg",
            ServiceRequest::ResetHomePosition => "reset_home_position",
            ServiceRequest::EndInteractiveContext => "end_interactive_context",
            ServiceRequest::RestoreInteractiveContext => "restore_interactive_context",
            ServiceRequest::Disconnect => "disconnect",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    pub request: ServiceRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Service reached, device link broken.
    Internal,
    Unavailable,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
}

impl From<ErrorBody> for ServiceError {
    fn from(body: ErrorBody) -> Self {
        match body.code {
            ErrorCode::Internal => ServiceError::DeviceLink(body.message),
            ErrorCode::Unavailable => ServiceError::Unavailable(body.message),
            ErrorCode::Unknown => ServiceError::Protocol(body.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasPowerResponse {
    pub has_power: bool,
}
