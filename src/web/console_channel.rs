//! Messages between the web handlers and the console task.

use tokio::sync::{mpsc, oneshot};

use super::models::{LogsResponse, StatusResponse};
use crate::director::{Action, PlotDirector};
use crate::error::DirectorError;

/// A request sent from a web handler to the console task.
#[derive(Debug)]
pub enum ConsoleRequest {
    GetStatus {
        respond_to: oneshot::Sender<StatusResponse>,
    },
    GetLogs {
        respond_to: oneshot::Sender<LogsResponse>,
    },
    /// Run one operator operation.
    Invoke {
        action: Action,
        respond_to: oneshot::Sender<Result<(), DirectorError>>,
    },
}

/// Serve console requests until every sender is dropped.
///
/// Operations run one at a time, in arrival order.
pub async fn serve_requests(director: PlotDirector, mut rx: mpsc::Receiver<ConsoleRequest>) {
    while let Some(request) = rx.recv().await {
        match request {
            ConsoleRequest::GetStatus { respond_to } => {
                let snapshot = director.snapshot().await;
                let _ = respond_to.send(StatusResponse::from(&snapshot));
            }
            ConsoleRequest::GetLogs { respond_to } => {
                let snapshot = director.snapshot().await;
                let _ = respond_to.send(LogsResponse::from(snapshot));
            }
            ConsoleRequest::Invoke { action, respond_to } => {
                let result = director.invoke(action).await;
                if let Err(e) = &result {
                    tracing::warn!("Operation failed: {}", e);
                }
                let _ = respond_to.send(result);
            }
        }
    }
    tracing::info!("Console channel closed");
}
