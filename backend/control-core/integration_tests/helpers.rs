//! Test helpers for control-core integration tests.
//!
//! - Marker scripts that append one line per run
//! - Control servers wired with the no-op port reclaimer
//! - Polling and HTTP shortcuts

use control_core::reclaim::NoopPortReclaimer;
use control_core::server::ControlServer;
use control_core::trigger::TriggerScheduler;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::{Instant, sleep};

/// A script in a temp dir that appends `fired` to a marker file each run.
pub struct MarkerScript {
    _dir: TempDir,
    pub script_path: PathBuf,
    pub marker_path: PathBuf,
}

impl MarkerScript {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let script_path = dir.path().join("hibernate.sh");
        let marker_path = dir.path().join("marker.txt");

        std::fs::write(
            &script_path,
            format!("echo fired >> \"{}\"\n", marker_path.display()),
        )
        .expect("Failed to write marker script");

        Self {
            _dir: dir,
            script_path,
            marker_path,
        }
    }

    pub fn script(&self) -> String {
        self.script_path.to_string_lossy().into_owned()
    }

    /// Number of runs recorded so far.
    pub fn runs(&self) -> usize {
        count_lines(&self.marker_path)
    }
}

pub fn count_lines(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

/// Control server that never kills other processes.
pub fn test_server(trigger_delay: Duration) -> ControlServer {
    ControlServer::new(
        Arc::new(NoopPortReclaimer),
        TriggerScheduler::new(trigger_delay),
    )
}

/// Poll `check` every 25ms until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(25)).await;
    }
}

pub fn url(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{port}{path}")
}

/// GET with a fresh client, so no pooled connection outlives a listener.
pub async fn get(port: u16, path: &str) -> Result<reqwest::Response, reqwest::Error> {
    reqwest::Client::new()
        .get(url(port, path))
        .timeout(Duration::from_secs(5))
        .send()
        .await
}
