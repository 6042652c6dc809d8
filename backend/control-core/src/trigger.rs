//! Deferred execution of the configured script.
//!
//! The action route answers the phone first and only then, after
//! [`TRIGGER_DELAY`](crate::TRIGGER_DELAY), runs the script. Once the script
//! starts the host is expected to go down, so nothing downstream waits on the
//! outcome: failures end up in the log and nowhere else.

use crate::TRIGGER_DELAY;
use crate::error::trigger::TriggerError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use log::{debug, error, info};
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;
use tokio::task::JoinHandle;
use tokio::time::sleep as TokioSleep;

#[cfg(unix)]
const SCRIPT_INTERPRETER: &str = "sh";
#[cfg(windows)]
const SCRIPT_INTERPRETER: &str = "cmd";

pub(crate) fn build_script_command(script_path: &Path) -> TokioCommand {
    let mut cmd = TokioCommand::new(SCRIPT_INTERPRETER);

    #[cfg(windows)]
    cmd.arg("/C");

    cmd.arg(script_path).stdin(Stdio::null());

    // Own process group: a Ctrl-C aimed at us must not reach the script.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}

/// Run the script at `script_path` to completion.
///
/// # Errors
///
/// * [`TriggerError::Spawn`] - The interpreter could not be started
/// * [`TriggerError::Exit`] - The script ran but exited unsuccessfully
pub async fn fire(script_path: &Path) -> Result<ExitStatus, TriggerError> {
    let location = ErrorLocation::from(Location::caller());

    let mut child = build_script_command(script_path)
        .spawn()
        .map_err(|e| TriggerError::Spawn {
            message: format!("Failed to start {}: {e}", script_path.display()),
            location,
            source: e,
        })?;

    info!(
        "Started script {} (PID: {:?})",
        script_path.display(),
        child.id()
    );

    let status = child.wait().await.map_err(|e| TriggerError::Spawn {
        message: format!("Failed to wait for {}: {e}", script_path.display()),
        location,
        source: e,
    })?;

    if !status.success() {
        return Err(TriggerError::Exit {
            message: format!("{} exited with {status}", script_path.display()),
            code: status.code(),
            location,
        });
    }

    debug!("Script {} finished: {status}", script_path.display());
    Ok(status)
}

/// Schedules script runs after a fixed delay.
///
/// Production uses [`TRIGGER_DELAY`]; tests build one with a shorter delay.
#[derive(Debug, Clone, Copy)]
pub struct TriggerScheduler {
    delay: Duration,
}

impl Default for TriggerScheduler {
    fn default() -> Self {
        Self::new(TRIGGER_DELAY)
    }
}

impl TriggerScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawn a task that waits out the delay and then runs the script.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// [`ScheduledTrigger`] detaches the task; it still runs.
    pub fn schedule(&self, script_path: impl Into<PathBuf>) -> ScheduledTrigger {
        let script_path = script_path.into();
        let delay = self.delay;
        let task_path = script_path.clone();

        debug!(
            "Scheduling {} to run in {delay:?}",
            script_path.display()
        );

        let task = TokioSpawn(async move {
            if !delay.is_zero() {
                TokioSleep(delay).await;
            }

            let result = fire(&task_path).await;
            if let Err(ref e) = result {
                error!("Trigger script failed: {e}");
            }
            result
        });

        ScheduledTrigger { script_path, task }
    }
}

/// A script run that has been scheduled but may not have started yet.
#[derive(Debug)]
pub struct ScheduledTrigger {
    script_path: PathBuf,
    task: JoinHandle<Result<ExitStatus, TriggerError>>,
}

impl ScheduledTrigger {
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Abort the run if it has not finished. Unused by the control server.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Wait for the run to finish.
    ///
    /// Returns `None` if the task was cancelled or panicked.
    pub async fn wait(self) -> Option<Result<ExitStatus, TriggerError>> {
        self.task.await.ok()
    }
}
