//! Command dispatch loop.
//!
//! One spawned task per job drains the loaded script into the plot service.
//! The task only makes progress while the job is `Plotting`; any other state
//! parks it in a poll loop, which is how pause and resume work. Cancellation
//! is cooperative: a flag checked under the console lock each time the loop
//! is re-entered, so a remote call already in flight is allowed to finish but
//! its result is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::job::{ConsoleState, JobState, Severity};
use crate::notify::CompletionNotifier;
use crate::script::{CommandKind, PlotScript};
use crate::service::{PlotService, ServiceError};

pub type SharedState = Arc<RwLock<ConsoleState>>;

/// Suspension intervals of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTiming {
    pub pause_poll: Duration,
    pub command_delay: Duration,
}

impl Default for DispatchTiming {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchTiming {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            pause_poll: config.pause_poll(),
            command_delay: config.command_delay(),
        }
    }
}

/// Handle on one spawned dispatch loop.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    cancelled: Arc<AtomicBool>,
    iterations: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Number of queue entries the loop has taken so far.
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobInfo {
    pub id: Uuid,
    pub active: bool,
    pub iterations: u64,
}

pub struct CommandDispatcher {
    state: SharedState,
    notifier: Arc<CompletionNotifier>,
    timing: DispatchTiming,
    current: Mutex<Option<JobHandle>>,
    spawned: AtomicUsize,
}

impl CommandDispatcher {
    pub fn new(state: SharedState, timing: DispatchTiming, notifier: Arc<CompletionNotifier>) -> Self {
        Self {
            state,
            notifier,
            timing,
            current: Mutex::new(None),
            spawned: AtomicUsize::new(0),
        }
    }

    /// Spawn the dispatch loop and move the job to `Plotting`.
    ///
    /// Returns `None` without doing anything if a loop for the current job is
    /// still running.
    pub async fn start(&self, service: Arc<dyn PlotService>) -> Option<Uuid> {
        let mut current = self.current.lock().await;
        if let Some(handle) = current.as_ref() {
            if handle.is_active() {
                tracing::debug!(job = %handle.id, "Dispatch loop already running");
                return None;
            }
        }

        self.state.write().await.transition(JobState::Plotting);

        let id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        let iterations = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(run_loop(
            self.state.clone(),
            service,
            self.notifier.clone(),
            self.timing,
            LoopContext {
                id,
                cancelled: cancelled.clone(),
                iterations: iterations.clone(),
            },
        ));
        *current = Some(JobHandle {
            id,
            cancelled,
            iterations,
            task,
        });
        self.spawned.fetch_add(1, Ordering::SeqCst);
        tracing::info!(job = %id, "Dispatch loop spawned");
        Some(id)
    }

    pub async fn is_active(&self) -> bool {
        self.current.lock().await.as_ref().is_some_and(JobHandle::is_active)
    }

    pub async fn current_job(&self) -> Option<JobInfo> {
        self.current.lock().await.as_ref().map(|handle| JobInfo {
            id: handle.id,
            active: handle.is_active(),
            iterations: handle.iterations(),
        })
    }

    /// Total loops spawned by this dispatcher.
    pub fn loops_spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Stop the current job and return the console to `Idle`.
    ///
    /// The loop is flagged, the unconsumed queue is dropped, and `service` (if
    /// any) is asked to disconnect. Disconnect failures are logged, never
    /// returned.
    pub async fn cancel(&self, service: Option<Arc<dyn PlotService>>) {
        let handle = self.current.lock().await.take();
        {
            let mut console = self.state.write().await;
            if let Some(handle) = handle.as_ref() {
                handle.cancelled.store(true, Ordering::SeqCst);
                tracing::info!(job = %handle.id, "Dispatch loop cancelled");
            }
            if let Some(mut script) = console.script.take() {
                let discarded = script.discard_remaining();
                tracing::info!(discarded, "Discarding remaining commands");
            }
        }

        if let Some(service) = service {
            let result = service.disconnect().await;
            let mut console = self.state.write().await;
            match result {
                Ok(response) if response.success => console.log_message(&response.message),
                Ok(response) => console.log_status(&response.message, Severity::Error),
                Err(e) => report_service_error(&mut console, "Disconnect plot", &e),
            }
        }

        self.state.write().await.transition(JobState::Idle);
    }
}

struct LoopContext {
    id: Uuid,
    cancelled: Arc<AtomicBool>,
    iterations: Arc<AtomicU64>,
}

impl LoopContext {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

const COMPLETION_MESSAGE: &str = "Plot completed";

/// What the loop does after looking at the queue.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// Not plotting any more; back to the poll.
    Park,
    Cancelled,
    Finished,
    /// A directive or comment, already dealt with.
    Handled,
    Send(String),
}

/// Pop and classify the next entry. Runs under the console write lock.
fn take_next(console: &mut ConsoleState, job: &LoopContext) -> Step {
    if job.is_cancelled() {
        return Step::Cancelled;
    }
    // The state may have changed since the poll dropped its read lock.
    if console.state() != JobState::Plotting {
        return Step::Park;
    }
    let Some(command) = console.script.as_mut().and_then(PlotScript::next_command) else {
        console.transition(JobState::Finished);
        return Step::Finished;
    };
    job.iterations.fetch_add(1, Ordering::SeqCst);
    match CommandKind::classify(&command) {
        CommandKind::Pause => {
            console.transition(JobState::Paused);
            console.log_message(&command);
            Step::Handled
        }
        CommandKind::Comment => {
            console.log_command(&command);
            Step::Handled
        }
        CommandKind::Device => Step::Send(command),
    }
}

async fn run_loop(
    state: SharedState,
    service: Arc<dyn PlotService>,
    notifier: Arc<CompletionNotifier>,
    timing: DispatchTiming,
    job: LoopContext,
) {
    tracing::info!(job = %job.id, "Dispatch loop started");
    loop {
        // Parked here while paused or calibrating.
        loop {
            if job.is_cancelled() {
                tracing::info!(job = %job.id, "Dispatch loop exiting after cancel");
                return;
            }
            if state.read().await.state() == JobState::Plotting {
                break;
            }
            sleep(timing.pause_poll).await;
        }

        let step = take_next(&mut *state.write().await, &job);
        match step {
            Step::Park => continue,
            Step::Cancelled => {
                tracing::info!(job = %job.id, "Dispatch loop exiting after cancel");
                return;
            }
            Step::Finished => {
                tracing::info!(job = %job.id, "Plot finished");
                announce_completion(&state, &notifier, job.id).await;
                return;
            }
            Step::Handled => {}
            Step::Send(command) => {
                tracing::debug!(job = %job.id, "Dispatching '{}'", command);
                let result = service.process_command(&command).await;
                let mut console = state.write().await;
                if job.is_cancelled() {
                    tracing::info!(job = %job.id, "Dropping result of '{}' after cancel", command);
                    return;
                }
                match result {
                    Ok(response) if response.success => {
                        console.progress.record_completed();
                        console.log_command(&command);
                    }
                    Ok(response) => {
                        let message = if response.message.is_empty() {
                            format!("Command '{}' failed", command)
                        } else {
                            response.message
                        };
                        console.log_status(&message, Severity::Error);
                        console.log_command(&command);
                    }
                    Err(e) => {
                        report_service_error(&mut console, &format!("Process command '{}'", command), &e);
                    }
                }
            }
        }

        sleep(timing.command_delay).await;
        tokio::task::yield_now().await;
    }
}

/// Send the completion webhook. A failure is logged and otherwise ignored.
async fn announce_completion(state: &SharedState, notifier: &CompletionNotifier, job: Uuid) {
    if let Err(e) = notifier.notify(COMPLETION_MESSAGE).await {
        tracing::warn!(job = %job, "{}", e);
        state
            .write()
            .await
            .log_status("Plot completed notification failed", Severity::Warning);
    }
}

/// Turn a failed remote call into an operator-visible `ERROR:` line.
pub(crate) fn report_service_error(console: &mut ConsoleState, operation: &str, error: &ServiceError) {
    tracing::error!(error = %error, "{} failed", operation);
    console.log_status(&error.hint(operation), Severity::Error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;

    fn loaded_console(commands: &[&str]) -> ConsoleState {
        let mut console = ConsoleState::new(&LogConfig::default());
        let commands = commands.iter().map(|line| line.to_string()).collect();
        console.script = Some(PlotScript::new(vec![], vec![], commands));
        console.transition(JobState::Plotting);
        console
    }

    fn job() -> LoopContext {
        LoopContext {
            id: Uuid::new_v4(),
            cancelled: Arc::new(AtomicBool::new(false)),
            iterations: Arc::new(AtomicU64::new(0)),
        }
    }

    fn remaining(console: &ConsoleState) -> usize {
        console.script.as_ref().map_or(0, PlotScript::remaining_len)
    }

    #[test]
    fn paused_between_poll_and_pop_takes_nothing() {
        let mut console = loaded_console(&["moveto 0 0", "lineto 1 1"]);
        let job = job();
        console.transition(JobState::Paused);

        assert_eq!(take_next(&mut console, &job), Step::Park);
        assert_eq!(remaining(&console), 2);
        assert_eq!(job.iterations.load(Ordering::SeqCst), 0);
        assert_eq!(console.state(), JobState::Paused);
    }

    #[test]
    fn cancel_wins_over_pop() {
        let mut console = loaded_console(&["moveto 0 0"]);
        let job = job();
        job.cancelled.store(true, Ordering::SeqCst);

        assert_eq!(take_next(&mut console, &job), Step::Cancelled);
        assert_eq!(remaining(&console), 1);
    }

    #[test]
    fn entries_are_classified_in_order() {
        let mut console = loaded_console(&["moveto 0 0", "#note", "pause"]);
        let job = job();

        assert_eq!(take_next(&mut console, &job), Step::Send("moveto 0 0".to_string()));
        assert_eq!(take_next(&mut console, &job), Step::Handled);
        assert_eq!(console.commands.last(), Some("#note"));
        assert_eq!(take_next(&mut console, &job), Step::Handled);
        assert_eq!(console.state(), JobState::Paused);
        assert_eq!(take_next(&mut console, &job), Step::Park);

        console.transition(JobState::Plotting);
        assert_eq!(take_next(&mut console, &job), Step::Finished);
        assert_eq!(console.state(), JobState::Finished);
        assert_eq!(job.iterations.load(Ordering::SeqCst), 3);
    }
}
