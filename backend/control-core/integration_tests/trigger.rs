use crate::helpers::MarkerScript;

use control_core::error::trigger::TriggerError;
use control_core::trigger::{TriggerScheduler, fire};

use std::path::Path;
use std::time::{Duration, Instant};

use tokio::time::sleep;

/// **VALUE**: Verifies a healthy script runs to completion.
///
/// **WHY THIS MATTERS**: This is the only side effect the whole app has.
///
/// **BUG THIS CATCHES**: Would catch the path being passed to the wrong
/// interpreter or the child never being awaited.
#[cfg(unix)]
#[tokio::test]
async fn given_marker_script_when_fired_then_runs_once_and_succeeds() {
    let marker = MarkerScript::new();

    let status = fire(&marker.script_path).await.expect("script should run");

    assert!(status.success());
    assert_eq!(marker.runs(), 1);
}

/// **VALUE**: Verifies a missing script is reported, not ignored.
///
/// **WHY THIS MATTERS**: A typo in the settings is the most common way for
/// hibernate to silently not happen; the log is the only place it shows.
///
/// **BUG THIS CATCHES**: Would catch non-zero exits being treated as success.
#[cfg(unix)]
#[tokio::test]
async fn given_missing_script_when_fired_then_returns_exit_error() {
    let result = fire(Path::new("/nonexistent/hibernate-remote/script.sh")).await;

    match result {
        Err(TriggerError::Exit { code, .. }) => {
            assert_ne!(code, Some(0));
        }
        other => panic!("Expected exit error, got {other:?}"),
    }
}

/// **VALUE**: Verifies the scheduler waits out the delay before running.
///
/// **WHY THIS MATTERS**: The phone must get its confirmation page before the
/// machine goes down.
///
/// **BUG THIS CATCHES**: Would catch the delay being skipped.
#[cfg(unix)]
#[tokio::test]
async fn given_delay_when_scheduled_then_script_runs_after_delay() {
    let marker = MarkerScript::new();
    let scheduler = TriggerScheduler::new(Duration::from_millis(300));
    let started = Instant::now();

    let scheduled = scheduler.schedule(&marker.script_path);
    assert_eq!(scheduled.script_path(), marker.script_path.as_path());
    assert_eq!(marker.runs(), 0);

    let result = scheduled.wait().await.expect("task should not be cancelled");

    assert!(result.is_ok(), "{result:?}");
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(marker.runs(), 1);
}

/// **VALUE**: Verifies cancel stops a pending run.
///
/// **WHY THIS MATTERS**: Cancellation is the only way to take back a trigger
/// still inside its delay.
///
/// **BUG THIS CATCHES**: Would catch `cancel` being a no-op.
#[cfg(unix)]
#[tokio::test]
async fn given_pending_trigger_when_cancelled_then_script_never_runs() {
    let marker = MarkerScript::new();
    let scheduler = TriggerScheduler::new(Duration::from_millis(500));

    let scheduled = scheduler.schedule(&marker.script_path);
    scheduled.cancel();

    assert!(scheduled.wait().await.is_none());
    sleep(Duration::from_millis(700)).await;
    assert_eq!(marker.runs(), 0);
}

/// **VALUE**: Verifies a dropped trigger handle still runs.
///
/// **WHY THIS MATTERS**: The action route drops the handle right away.
///
/// **BUG THIS CATCHES**: Would catch drop-to-cancel semantics creeping in.
#[cfg(unix)]
#[tokio::test]
async fn given_detached_trigger_when_handle_dropped_then_script_still_runs() {
    let marker = MarkerScript::new();
    let scheduler = TriggerScheduler::new(Duration::ZERO);

    drop(scheduler.schedule(&marker.script_path));

    assert!(
        crate::helpers::wait_until(Duration::from_secs(2), || marker.runs() == 1).await,
        "detached trigger should still fire"
    );
}
