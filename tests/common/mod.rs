//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

use plot_director::config::Config;
use plot_director::dispatcher::DispatchTiming;
use plot_director::director::PlotDirector;
use plot_director::job::JobState;
use plot_director::service::{Axis, CommandResponse, PlotService, ServiceConnector, ServiceError};

pub const EXAMPLE_SCRIPT: &str =
    "a 1\n::END_OPTIONS::\n\n::END_DEFINITIONS::\nmoveto 0 0\n#note\npause extra\nlineto 1 1\n";

/// Plot service double with scriptable failures.
#[derive(Default)]
pub struct MockPlotService {
    pub calls: Mutex<Vec<String>>,
    /// Commands answered with `success=false`.
    pub rejected: HashSet<String>,
    /// Commands that fail at the transport level.
    pub broken: HashSet<String>,
    pub init_rejected: bool,
    pub init_unreachable: bool,
    pub no_power: bool,
    pub disconnect_fails: bool,
    pub calibration_unreachable: bool,
    /// `reset_home_position` answers with `success=false`.
    pub reset_rejected: bool,
    /// Time each `process_command` takes.
    pub command_latency: Duration,
}

impl MockPlotService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands that reached `process_command`, in order.
    pub fn processed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix("process_command ").map(str::to_string))
            .collect()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calibration_reply(&self, message: &str) -> Result<CommandResponse, ServiceError> {
        if self.calibration_unreachable {
            Err(ServiceError::Unavailable("connection refused".to_string()))
        } else {
            Ok(CommandResponse::ok(message))
        }
    }
}

#[async_trait]
impl PlotService for MockPlotService {
    async fn initialize_plot(
        &self,
        options: &[String],
        definitions: &[String],
    ) -> Result<CommandResponse, ServiceError> {
        self.record(format!("initialize_plot {:?} {:?}", options, definitions));
        if self.init_unreachable {
            return Err(ServiceError::Unavailable("connection refused".to_string()));
        }
        if self.init_rejected {
            return Ok(CommandResponse::failed("Bad plot options"));
        }
        Ok(CommandResponse::ok("Plotter initialized"))
    }

    async fn has_power(&self) -> Result<bool, ServiceError> {
        self.record("has_power");
        Ok(!self.no_power)
    }

    async fn process_command(&self, command: &str) -> Result<CommandResponse, ServiceError> {
        self.record(format!("process_command {}", command));
        if !self.command_latency.is_zero() {
            tokio::time::sleep(self.command_latency).await;
        }
        if self.broken.contains(command) {
            return Err(ServiceError::DeviceLink("serial link lost".to_string()));
        }
        if self.rejected.contains(command) {
            return Ok(CommandResponse::failed(""));
        }
        Ok(CommandResponse::ok(""))
    }

    async fn walk_home(&self, axis: Axis, distance: f32) -> Result<CommandResponse, ServiceError> {
        self.record(format!("walk_home {} {}", axis, distance));
        self.calibration_reply("Walked")
    }

    async fn plot_alignment_svg(&self) -> Result<CommandResponse, ServiceError> {
        self.record("plot_alignment_svg");
        self.calibration_reply("Alignment plotted")
    }

    async fn reset_home_position(&self) -> Result<CommandResponse, ServiceError> {
        self.record("reset_home_position");
        if self.reset_rejected {
            return Ok(CommandResponse::failed("Home reset failed"));
        }
        self.calibration_reply("Home reset")
    }

    async fn end_interactive_context(&self) -> Result<CommandResponse, ServiceError> {
        self.record("end_interactive_context");
        self.calibration_reply("Context ended")
    }

    async fn restore_interactive_context(&self) -> Result<CommandResponse, ServiceError> {
        self.record("restore_interactive_context");
        self.calibration_reply("Context restored")
    }

    async fn disconnect(&self) -> Result<CommandResponse, ServiceError> {
        self.record("disconnect");
        if self.disconnect_fails {
            return Err(ServiceError::Unavailable("already gone".to_string()));
        }
        Ok(CommandResponse::ok("Disconnected"))
    }
}

pub struct MockConnector {
    pub service: Arc<MockPlotService>,
}

impl ServiceConnector for MockConnector {
    fn connect(&self) -> Arc<dyn PlotService> {
        self.service.clone()
    }
}

pub fn fast_timing() -> DispatchTiming {
    DispatchTiming {
        pause_poll: Duration::from_millis(2),
        command_delay: Duration::from_millis(1),
    }
}

pub fn director_with(service: MockPlotService) -> (PlotDirector, Arc<MockPlotService>) {
    let service = Arc::new(service);
    let connector = Arc::new(MockConnector {
        service: service.clone(),
    });
    (
        PlotDirector::with_timing(Config::default(), connector, fast_timing()),
        service,
    )
}

pub fn script_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

/// Poll until the director reaches `state`, panicking after a few seconds.
pub async fn wait_for_state(director: &PlotDirector, state: JobState) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while director.state().await != state {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {:?}, still {:?}", state, director.state().await);
}
