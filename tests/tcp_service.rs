//! Tests for the JSON-lines plot service client against an in-test server

use plot_director::service::protocol::{RequestFrame, ServiceRequest};
use plot_director::service::{Axis, PlotService, ServiceError, TcpPlotService};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Serve every accepted connection with `reply`, recording each request.
async fn spawn_server<F>(reply: F) -> (String, Arc<Mutex<Vec<ServiceRequest>>>)
where
    F: Fn(u64, &ServiceRequest) -> Value + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let reply = Arc::new(reply);
    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            let reply = reply.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.into_split();
                let mut lines = BufReader::new(read_half).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let frame: RequestFrame = serde_json::from_str(&line).unwrap();
                    let mut out = reply(frame.id, &frame.request).to_string();
                    log.lock().unwrap().push(frame.request);
                    out.push('\n');
                    if write_half.write_all(out.as_bytes()).await.is_err() {
                        return;
                    }
                }
            });
        }
    });
    (address, seen)
}

fn client(address: &str) -> TcpPlotService {
    TcpPlotService::new(address, Duration::from_secs(2))
}

#[tokio::test]
async fn test_command_round_trip() {
    let (address, seen) = spawn_server(|id, request| match request {
        ServiceRequest::HasPower => json!({ "id": id, "result": { "has_power": false } }),
        _ => json!({ "id": id, "result": { "success": true, "message": "done" } }),
    })
    .await;
    let service = client(&address);

    let response = service.process_command("moveto 0 0").await.unwrap();
    assert!(response.success);
    assert_eq!(response.message, "done");
    assert!(!service.has_power().await.unwrap());
    service.walk_home(Axis::X, 0.1).await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ServiceRequest::ProcessCommand {
                command: "moveto 0 0".to_string()
            },
            ServiceRequest::HasPower,
            ServiceRequest::WalkHome {
                axis: Axis::X,
                distance: 0.1
            },
        ]
    );
}

#[tokio::test]
async fn test_rejection_is_a_response_not_an_error() {
    let (address, _seen) =
        spawn_server(|id, _| json!({ "id": id, "result": { "success": false, "message": "out of bounds" } })).await;
    let response = client(&address).process_command("lineto 999 999").await.unwrap();
    assert!(!response.success);
    assert_eq!(response.message, "out of bounds");
}

#[tokio::test]
async fn test_error_codes_map_to_service_errors() {
    let (address, _seen) = spawn_server(|id, request| match request {
        ServiceRequest::ProcessCommand { .. } => {
            json!({ "id": id, "error": { "code": "internal", "message": "USB link lost" } })
        }
        ServiceRequest::Disconnect => {
            json!({ "id": id, "error": { "code": "unavailable", "message": "shutting down" } })
        }
        _ => json!({ "id": id, "error": { "code": "aborted", "message": "nope" } }),
    })
    .await;
    let service = client(&address);

    assert_eq!(
        service.process_command("moveto 0 0").await,
        Err(ServiceError::DeviceLink("USB link lost".to_string()))
    );
    assert_eq!(
        service.reset_home_position().await,
        Err(ServiceError::Protocol("nope".to_string()))
    );
    assert_eq!(
        service.disconnect().await,
        Err(ServiceError::Unavailable("shutting down".to_string()))
    );
}

#[tokio::test]
async fn test_mismatched_reply_id_is_rejected() {
    let (address, _seen) = spawn_server(|id, _| json!({ "id": id + 100, "result": { "success": true } })).await;
    let result = client(&address).plot_alignment_svg().await;
    assert!(matches!(result, Err(ServiceError::Protocol(_))));
}

#[tokio::test]
async fn test_reconnects_after_disconnect() {
    let (address, seen) = spawn_server(|id, _| json!({ "id": id, "result": { "success": true, "message": "" } })).await;
    let service = client(&address);

    service.end_interactive_context().await.unwrap();
    service.disconnect().await.unwrap();
    service.restore_interactive_context().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unreachable_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = client(&address).initialize_plot(&[], &[]).await;
    assert!(matches!(result, Err(ServiceError::Unavailable(_))));
}
