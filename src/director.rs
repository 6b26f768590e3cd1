//! Operator façade over the dispatch engine.
//!
//! [`PlotDirector`] owns the console state, the per-job plot service handle
//! and the dispatcher. Every operator request arrives as an [`Action`] and is
//! resolved to its handler in [`PlotDirector::invoke`]; requests whose
//! operation is not enabled in the current state are refused there.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};

use crate::config::Config;
use crate::dispatcher::{CommandDispatcher, DispatchTiming, SharedState, report_service_error};
use crate::error::DirectorError;
use crate::job::{ConsoleSnapshot, ConsoleState, JobState, Operation, ProgressStats, Severity};
use crate::notify::CompletionNotifier;
use crate::script;
use crate::service::{Axis, CommandResponse, PlotService, ServiceConnector, ServiceError};

/// A request for one operator operation, with its argument where it takes one.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadScript(PathBuf),
    StartPlot,
    Pause,
    Calibrate,
    Continue,
    Jog { axis: Axis, positive: bool },
    AlignmentPlot,
    Quit,
}

impl Action {
    pub fn operation(&self) -> Operation {
        match self {
            Action::LoadScript(_) => Operation::LoadScript,
            Action::StartPlot => Operation::StartPlot,
            Action::Pause => Operation::Pause,
            Action::Calibrate => Operation::Calibrate,
            Action::Continue => Operation::Continue,
            Action::Jog { axis: Axis::X, positive: true } => Operation::JogPlusX,
            Action::Jog { axis: Axis::X, positive: false } => Operation::JogMinusX,
            Action::Jog { axis: Axis::Y, positive: true } => Operation::JogPlusY,
            Action::Jog { axis: Axis::Y, positive: false } => Operation::JogMinusY,
            Action::AlignmentPlot => Operation::AlignmentPlot,
            Action::Quit => Operation::Quit,
        }
    }

    /// Build the action for `operation`. Only `LoadScript` uses `path`.
    pub fn from_operation(operation: Operation, path: Option<PathBuf>) -> Result<Self, DirectorError> {
        Ok(match operation {
            Operation::LoadScript => {
                Action::LoadScript(path.ok_or(DirectorError::MissingArgument(operation))?)
            }
            Operation::StartPlot => Action::StartPlot,
            Operation::Pause => Action::Pause,
            Operation::Calibrate => Action::Calibrate,
            Operation::Continue => Action::Continue,
            Operation::JogPlusX => Action::Jog { axis: Axis::X, positive: true },
            Operation::JogMinusX => Action::Jog { axis: Axis::X, positive: false },
            Operation::JogPlusY => Action::Jog { axis: Axis::Y, positive: true },
            Operation::JogMinusY => Action::Jog { axis: Axis::Y, positive: false },
            Operation::AlignmentPlot => Action::AlignmentPlot,
            Operation::Quit => Action::Quit,
        })
    }
}

struct DirectorInner {
    config: Config,
    connector: Arc<dyn ServiceConnector>,
    state: SharedState,
    service: Mutex<Option<Arc<dyn PlotService>>>,
    dispatcher: CommandDispatcher,
}

/// Cheaply clonable handle on the console.
#[derive(Clone)]
pub struct PlotDirector {
    inner: Arc<DirectorInner>,
}

impl PlotDirector {
    pub fn new(config: Config, connector: Arc<dyn ServiceConnector>) -> Self {
        let timing = DispatchTiming::from(&config.dispatch);
        Self::with_timing(config, connector, timing)
    }

    pub fn with_timing(config: Config, connector: Arc<dyn ServiceConnector>, timing: DispatchTiming) -> Self {
        let state = Arc::new(RwLock::new(ConsoleState::new(&config.logs)));
        let notifier = Arc::new(CompletionNotifier::from_config(&config.notify));
        let dispatcher = CommandDispatcher::new(state.clone(), timing, notifier);
        Self {
            inner: Arc::new(DirectorInner {
                config,
                connector,
                state,
                service: Mutex::new(None),
                dispatcher,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.inner.dispatcher
    }

    pub async fn state(&self) -> JobState {
        self.inner.state.read().await.state()
    }

    pub async fn snapshot(&self) -> ConsoleSnapshot {
        self.inner.state.read().await.snapshot()
    }

    pub async fn status_text(&self) -> String {
        self.inner.state.read().await.status_text()
    }

    pub async fn progress(&self) -> ProgressStats {
        self.inner.state.read().await.progress
    }

    pub async fn available_operations(&self) -> &'static [Operation] {
        self.state().await.available_operations()
    }

    /// Receiver that sees every job state transition.
    pub async fn subscribe(&self) -> watch::Receiver<JobState> {
        self.inner.state.read().await.machine.subscribe()
    }

    /// Run `action` if its operation is enabled in the current state.
    pub async fn invoke(&self, action: Action) -> Result<(), DirectorError> {
        let operation = action.operation();
        let state = self.state().await;
        if !state.allows(operation) {
            tracing::warn!(%operation, ?state, "Rejected operation");
            return Err(DirectorError::NotAvailable { operation, state });
        }
        tracing::info!(%operation, "Operator operation");

        match action {
            Action::LoadScript(path) => self.load_script(&path).await,
            Action::StartPlot => self.start_plot().await,
            Action::Pause => self.pause().await,
            Action::Calibrate => self.calibrate().await,
            Action::Continue => self.continue_plotting().await,
            Action::Jog { axis, positive } => {
                let step = self.inner.config.calibration.axis_step;
                self.walk_carriage(axis, if positive { step } else { -step }).await
            }
            Action::AlignmentPlot => self.alignment_plot().await,
            Action::Quit => {
                self.clear_plot().await;
                Ok(())
            }
        }
    }

    async fn current_service(&self) -> Option<Arc<dyn PlotService>> {
        self.inner.service.lock().await.clone()
    }

    /// Parse `path`, open the service handle and initialize the plotter.
    async fn load_script(&self, path: &Path) -> Result<(), DirectorError> {
        let script = match script::parse(path).await {
            Ok(script) => script,
            Err(e) => {
                let mut console = self.inner.state.write().await;
                console.log_status(&e.to_string(), Severity::Error);
                console.transition(JobState::Idle);
                return Err(e.into());
            }
        };

        let (options, definitions) = (script.options.clone(), script.definitions.clone());
        {
            let mut console = self.inner.state.write().await;
            console.progress = ProgressStats::new(script.command_count());
            console.script = Some(script);
        }
        tracing::info!("Plot file loaded: {}", path.display());

        let service = self.inner.connector.connect();
        *self.inner.service.lock().await = Some(service.clone());
        self.initialize_device(service, &options, &definitions).await
    }

    async fn initialize_device(
        &self,
        service: Arc<dyn PlotService>,
        options: &[String],
        definitions: &[String],
    ) -> Result<(), DirectorError> {
        match service.initialize_plot(options, definitions).await {
            Ok(response) => {
                self.inner.state.write().await.log_message(&response.message);
                self.check_power(service.as_ref()).await;
                if !response.success {
                    self.inner
                        .state
                        .write()
                        .await
                        .log_status("Error initializing plot", Severity::Error);
                    self.abandon_load().await;
                    return Err(DirectorError::Logic(response.message));
                }
                self.inner.state.write().await.transition(JobState::Ready);
                Ok(())
            }
            Err(e) => {
                report_service_error(&mut *self.inner.state.write().await, "Initialize plot", &e);
                self.abandon_load().await;
                Err(e.into())
            }
        }
    }

    /// Clear a job whose initialization failed. Its progress goes with it.
    async fn abandon_load(&self) {
        self.clear_plot().await;
        self.inner.state.write().await.progress = ProgressStats::default();
    }

    /// A device without power only earns a warning.
    async fn check_power(&self, service: &dyn PlotService) {
        match service.has_power().await {
            Ok(true) => {}
            Ok(false) => {
                let warning = DirectorError::Device("Check power to device".to_string());
                tracing::warn!("{}", warning);
                self.inner
                    .state
                    .write()
                    .await
                    .log_status("Check power to device", warning.severity());
            }
            Err(e) => report_service_error(&mut *self.inner.state.write().await, "Check device power", &e),
        }
    }

    async fn start_plot(&self) -> Result<(), DirectorError> {
        let Some(service) = self.current_service().await else {
            let mut console = self.inner.state.write().await;
            console.log_status("Unable to connect to plotting service", Severity::Error);
            drop(console);
            self.clear_plot().await;
            return Err(ServiceError::Unavailable("no plot service handle".to_string()).into());
        };
        // Resumes a parked loop; a fresh job is spawned below.
        self.inner.state.write().await.transition(JobState::Plotting);
        self.inner.dispatcher.start(service).await;
        Ok(())
    }

    async fn pause(&self) -> Result<(), DirectorError> {
        let mut console = self.inner.state.write().await;
        console.log_message("Plot manually paused");
        console.transition(JobState::Paused);
        Ok(())
    }

    async fn calibrate(&self) -> Result<(), DirectorError> {
        let service = self.require_service().await?;
        match service.end_interactive_context().await {
            Ok(response) => {
                let mut console = self.inner.state.write().await;
                if !response.success {
                    console.log_status(&response.message, Severity::Error);
                }
                console.transition(JobState::Calibrating);
                Ok(())
            }
            Err(e) => {
                report_service_error(&mut *self.inner.state.write().await, "Switch to calibration mode", &e);
                Err(e.into())
            }
        }
    }

    async fn walk_carriage(&self, axis: Axis, distance: f32) -> Result<(), DirectorError> {
        let service = self.require_service().await?;
        let result = service.walk_home(axis, distance).await;
        self.report(&format!("Walk carriage in {} axis", axis), result).await
    }

    async fn alignment_plot(&self) -> Result<(), DirectorError> {
        // The alignment drawing starts from a freshly reset home.
        self.reset_home_before("alignment plot").await;
        let service = self.require_service().await?;
        let result = service.plot_alignment_svg().await;
        self.report("Plot alignment SVG", result).await
    }

    /// Reset home ahead of `operation`. A failure is already on the operator
    /// log and does not stop the operation.
    async fn reset_home_before(&self, operation: &str) {
        if let Err(e) = self.reset_home_position().await {
            tracing::debug!("Home reset before {} failed: {}", operation, e);
        }
    }

    async fn reset_home_position(&self) -> Result<(), DirectorError> {
        let service = self.require_service().await?;
        let result = service.reset_home_position().await;
        self.report("Reset home position", result).await
    }

    async fn continue_plotting(&self) -> Result<(), DirectorError> {
        self.reset_home_before("continue").await;
        let service = self.require_service().await?;
        match service.restore_interactive_context().await {
            Ok(response) => {
                let mut console = self.inner.state.write().await;
                if !response.success {
                    console.log_status(&response.message, Severity::Error);
                }
                console.transition(JobState::Ready);
                Ok(())
            }
            Err(e) => {
                report_service_error(&mut *self.inner.state.write().await, "Restore interactive context", &e);
                Err(e.into())
            }
        }
    }

    /// Cancel the job, drop the script and service handle, back to `Idle`.
    pub async fn clear_plot(&self) {
        let service = self.inner.service.lock().await.take();
        self.inner.dispatcher.cancel(service).await;
        self.inner.state.write().await.commands.clear();
        tracing::info!("Plot data cleared");
    }

    /// Shut down on application exit. Never fails.
    pub async fn cleanup(&self) {
        let service = self.inner.service.lock().await.take();
        self.inner.dispatcher.cancel(service).await;
        self.inner.state.write().await.log_message("Stopped application");
        tracing::info!("Stopped application");
    }

    async fn require_service(&self) -> Result<Arc<dyn PlotService>, DirectorError> {
        match self.current_service().await {
            Some(service) => Ok(service),
            None => {
                let error = ServiceError::Unavailable("no plot service handle".to_string());
                self.inner
                    .state
                    .write()
                    .await
                    .log_status(&error.hint("Plot service"), Severity::Error);
                Err(error.into())
            }
        }
    }

    /// Log the outcome of a calibration call.
    async fn report(
        &self,
        operation: &str,
        result: Result<CommandResponse, ServiceError>,
    ) -> Result<(), DirectorError> {
        let mut console = self.inner.state.write().await;
        match result {
            Ok(response) if response.success => {
                console.log_message(&response.message);
                Ok(())
            }
            Ok(response) => {
                console.log_status(&response.message, Severity::Error);
                Err(DirectorError::Logic(response.message))
            }
            Err(e) => {
                report_service_error(&mut console, operation, &e);
                Err(e.into())
            }
        }
    }
}
