// src/service/tcp.rs - Line-oriented JSON client for the plot service
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::protocol::{HasPowerResponse, RequestFrame, ResponseFrame, ServiceRequest};
use super::{Axis, CommandResponse, PlotService, ServiceConnector, ServiceError};
use crate::config::ServiceConfig;

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// [`PlotService`] over a TCP stream, one JSON frame per line.
///
/// The stream is opened on first use. Calls are serialized, so exactly one
/// request is outstanding at a time. A broken stream is dropped and reopened
/// by the next call.
pub struct TcpPlotService {
    address: String,
    connect_timeout: Duration,
    connection: Mutex<Option<Connection>>,
    next_id: AtomicU64,
}

impl TcpPlotService {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            connection: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    async fn open(&self) -> Result<Connection, ServiceError> {
        tracing::info!("Connecting to plot service at {}", self.address);
        let stream = match timeout(self.connect_timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ServiceError::Unavailable(format!("{}: {}", self.address, e))),
            Err(_) => {
                return Err(ServiceError::Unavailable(format!(
                    "{}: connect timed out after {:?}",
                    self.address, self.connect_timeout
                )));
            }
        };
        stream.set_nodelay(true).map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        let (read_half, writer) = stream.into_split();
        Ok(Connection {
            reader: BufReader::new(read_half),
            writer,
        })
    }

    async fn call<T: DeserializeOwned>(&self, request: ServiceRequest) -> Result<T, ServiceError> {
        let method = request.method();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&RequestFrame { id, request })
            .map_err(|e| ServiceError::Protocol(e.to_string()))?;
        line.push('\n');

        let mut guard = self.connection.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
        }
        let Some(connection) = guard.as_mut() else {
            return Err(ServiceError::Unavailable("no connection".to_string()));
        };

        tracing::debug!(id, method, "Service TX");
        let reply = match exchange(connection, &line).await {
            Ok(reply) => reply,
            Err(e) => {
                // Stream state is unknown after an I/O failure.
                *guard = None;
                return Err(e);
            }
        };
        drop(guard);
        tracing::debug!(id, method, "Service RX: {}", reply.trim_end());

        let frame: ResponseFrame = serde_json::from_str(&reply)
            .map_err(|e| ServiceError::Protocol(format!("bad {} reply: {}", method, e)))?;
        if frame.id != id {
            return Err(ServiceError::Protocol(format!(
                "reply id {} does not match request id {}",
                frame.id, id
            )));
        }
        if let Some(error) = frame.error {
            return Err(error.into());
        }
        let result = frame
            .result
            .ok_or_else(|| ServiceError::Protocol(format!("{} reply has no result", method)))?;
        serde_json::from_value(result).map_err(|e| ServiceError::Protocol(format!("bad {} result: {}", method, e)))
    }
}

async fn exchange(connection: &mut Connection, line: &str) -> Result<String, ServiceError> {
    connection
        .writer
        .write_all(line.as_bytes())
        .await
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
    connection
        .writer
        .flush()
        .await
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

    let mut reply = String::new();
    let read = connection
        .reader
        .read_line(&mut reply)
        .await
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
    if read == 0 {
        return Err(ServiceError::Unavailable("connection closed by plot service".to_string()));
    }
    Ok(reply)
}

#[async_trait]
impl PlotService for TcpPlotService {
    async fn initialize_plot(
        &self,
        options: &[String],
        definitions: &[String],
    ) -> Result<CommandResponse, ServiceError> {
        self.call(ServiceRequest::InitializePlot {
            options: options.to_vec(),
            definitions: definitions.to_vec(),
        })
        .await
    }

    async fn has_power(&self) -> Result<bool, ServiceError> {
        let response: HasPowerResponse = self.call(ServiceRequest::HasPower).await?;
        Ok(response.has_power)
    }

    async fn process_command(&self, command: &str) -> Result<CommandResponse, ServiceError> {
        self.call(ServiceRequest::ProcessCommand {
            command: command.to_string(),
        })
        .await
    }

    async fn walk_home(&self, axis: Axis, distance: f32) -> Result<CommandResponse, ServiceError> {
        self.call(ServiceRequest::WalkHome { axis, distance }).await
    }

    async fn plot_alignment_svg(&self) -> Result<CommandResponse, ServiceError> {
        self.call(ServiceRequest::PlotAlignmentSvg).await
    }

    async fn reset_home_position(&self) -> Result<CommandResponse, ServiceError> {
        self.call(ServiceRequest::ResetHomePosition).await
    }

    async fn end_interactive_context(&self) -> Result<CommandResponse, ServiceError> {
        self.call(ServiceRequest::EndInteractiveContext).await
    }

    async fn restore_interactive_context(&self) -> Result<CommandResponse, ServiceError> {
        self.call(ServiceRequest::RestoreInteractiveContext).await
    }

    async fn disconnect(&self) -> Result<CommandResponse, ServiceError> {
        let response = self.call(ServiceRequest::Disconnect).await;
        *self.connection.lock().await = None;
        response
    }
}

/// Hands out a fresh [`TcpPlotService`] per job.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.address(), config.connect_timeout())
    }
}

impl ServiceConnector for TcpConnector {
    fn connect(&self) -> Arc<dyn PlotService> {
        Arc::new(TcpPlotService::new(self.address.clone(), self.connect_timeout))
    }
}
