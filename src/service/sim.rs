// src/service/sim.rs - In-process plot service for dry runs
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{Axis, CommandResponse, PlotService, ServiceConnector, ServiceError};

/// Accepts every call and remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct SimulatedPlotService {
    received: Mutex<Vec<String>>,
}

impl SimulatedPlotService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, formatted as `method args`.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        tracing::debug!("Simulated plot service: {}", call);
        if let Ok(mut calls) = self.received.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl PlotService for SimulatedPlotService {
    async fn initialize_plot(
        &self,
        options: &[String],
        definitions: &[String],
    ) -> Result<CommandResponse, ServiceError> {
        self.record(format!(
            "initialize_plot {} options {} definitions",
            options.len(),
            definitions.len()
        ));
        Ok(CommandResponse::ok("Simulated plotter initialized successfully"))
    }

    async fn has_power(&self) -> Result<bool, ServiceError> {
        self.record("has_power".to_string());
        Ok(true)
    }

    async fn process_command(&self, command: &str) -> Result<CommandResponse, ServiceError> {
        self.record(format!("process_command {}", command));
        Ok(CommandResponse::ok(""))
    }

    async fn walk_home(&self, axis: Axis, distance: f32) -> Result<CommandResponse, ServiceError> {
        self.record(format!("walk_home {} {}", axis, distance));
        Ok(CommandResponse::ok(format!("Walked carriage {} mm along {}", distance, axis)))
    }

    async fn plot_alignment_svg(&self) -> Result<CommandResponse, ServiceError> {
        self.record("plot_alignment_svg".to_string());
        Ok(CommandResponse::ok("Alignment plot complete"))
    }

    async fn reset_home_position(&self) -> Result<CommandResponse, ServiceError> {
        self.record("reset_home_position".to_string());
        Ok(CommandResponse::ok("Home position reset"))
    }

    async fn end_interactive_context(&self) -> Result<CommandResponse, ServiceError> {
        self.record("end_interactive_context".to_string());
        Ok(CommandResponse::ok("Interactive context ended"))
    }

    async fn restore_interactive_context(&self) -> Result<CommandResponse, ServiceError> {
        self.record("restore_interactive_context".to_string());
        Ok(CommandResponse::ok("Interactive context restored"))
    }

    async fn disconnect(&self) -> Result<CommandResponse, ServiceError> {
        self.record("disconnect".to_string());
        Ok(CommandResponse::ok("Successfully disconnected from simulated plotter"))
    }
}

/// Connector that always hands out the same simulated service.
#[derive(Debug, Clone, Default)]
pub struct SimulatedConnector {
    service: Arc<SimulatedPlotService>,
}

impl SimulatedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&self) -> Arc<SimulatedPlotService> {
        self.service.clone()
    }
}

impl ServiceConnector for SimulatedConnector {
    fn connect(&self) -> Arc<dyn PlotService> {
        self.service.clone()
    }
}
