//! Defines the Axum API routes and handlers.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::sync::{mpsc::Sender, oneshot};

use crate::director::{Action, PlotDirector};
use crate::error::DirectorError;
use crate::job::Operation;
use crate::web::console_channel::{ConsoleRequest, serve_requests};
use crate::web::models::OperationRequest;

pub type AppState = Sender<ConsoleRequest>;

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(console_tx: AppState) -> Router {
    Router::new()
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/logs", get(get_logs))
        .route("/api/v1/operations/{id}", post(invoke_operation))
        .with_state(console_tx)
}

/// Router backed by a freshly spawned console task serving `director`.
pub fn app_with_state(director: PlotDirector) -> Router {
    let (console_tx, console_rx) = tokio::sync::mpsc::channel(16);
    tokio::spawn(serve_requests(director, console_rx));
    create_router(console_tx)
}

async fn get_status(State(console_tx): State<AppState>) -> Response {
    let (resp_tx, resp_rx) = oneshot::channel();
    if console_tx.send(ConsoleRequest::GetStatus { respond_to: resp_tx }).await.is_err() {
        return json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR);
    }
    match resp_rx.await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(_) => json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn get_logs(State(console_tx): State<AppState>) -> Response {
    let (resp_tx, resp_rx) = oneshot::channel();
    if console_tx.send(ConsoleRequest::GetLogs { respond_to: resp_tx }).await.is_err() {
        return json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR);
    }
    match resp_rx.await {
        Ok(logs) => (StatusCode::OK, Json(logs)).into_response(),
        Err(_) => json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Handler for one operator operation. The body is optional JSON.
async fn invoke_operation(State(console_tx): State<AppState>, Path(id): Path<String>, body: Bytes) -> Response {
    let operation: Operation = match id.parse() {
        Ok(operation) => operation,
        Err(e) => return json_error(&format!("{}", e), StatusCode::NOT_FOUND),
    };
    let payload = if body.is_empty() {
        OperationRequest::default()
    } else {
        match serde_json::from_slice::<OperationRequest>(&body) {
            Ok(payload) => payload,
            Err(e) => return json_error(&format!("Invalid request body: {}", e), StatusCode::BAD_REQUEST),
        }
    };
    let action = match Action::from_operation(operation, payload.path) {
        Ok(action) => action,
        Err(e) => return json_error(&e.to_string(), StatusCode::BAD_REQUEST),
    };

    let (resp_tx, resp_rx) = oneshot::channel();
    if console_tx
        .send(ConsoleRequest::Invoke {
            action,
            respond_to: resp_tx,
        })
        .await
        .is_err()
    {
        return json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR);
    }
    match resp_rx.await {
        Ok(Ok(())) => (StatusCode::OK, Json(serde_json::json!({ "result": "ok" }))).into_response(),
        Ok(Err(e @ DirectorError::MissingArgument(_))) => json_error(&e.to_string(), StatusCode::BAD_REQUEST),
        Ok(Err(e)) => json_error(&e.to_string(), StatusCode::CONFLICT),
        Err(_) => json_error("Internal error", StatusCode::INTERNAL_SERVER_ERROR),
    }
}
