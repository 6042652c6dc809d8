use hibernate_remote::display::spawn_status_display;
use hibernate_remote::paths::AppPaths;
use hibernate_remote::settings::{apply_from_disk, load_or_create};

use control_core::config::ServerConfig;
use control_core::coordinator::LifecycleCoordinator;
use control_core::reclaim::NoopPortReclaimer;
use control_core::server::{ControlServer, ServerStatus};
use control_core::trigger::TriggerScheduler;

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

// ============================================================================
// Integration tests for settings + control-core
// These drive the same load/apply path main uses, minus the signals
// ============================================================================

fn coordinator() -> LifecycleCoordinator {
    LifecycleCoordinator::new(ControlServer::new(
        Arc::new(NoopPortReclaimer),
        TriggerScheduler::new(Duration::ZERO),
    ))
}

/// **VALUE**: Verifies first run writes the defaults to disk.
///
/// **WHY THIS MATTERS**: The operator edits config.json by hand; it has to
/// exist to be edited.
///
/// **BUG THIS CATCHES**: Would catch defaults being used but never persisted.
#[test]
fn given_no_config_file_when_loaded_then_defaults_are_written() {
    // GIVEN: An empty config dir
    let temp_dir = TempDir::new().unwrap();
    let paths = AppPaths::from_config_dir(temp_dir.path());

    // WHEN: Loading
    let config = load_or_create(&paths).expect("first run should succeed");

    // THEN: Defaults returned and persisted
    assert_eq!(config, ServerConfig::default());
    assert!(ServerConfig::file_path(paths.config_dir()).exists());
    assert_eq!(ServerConfig::load(paths.config_dir()).unwrap(), config);
}

/// **VALUE**: Verifies an existing file is left untouched.
///
/// **WHY THIS MATTERS**: Overwriting the operator's settings with defaults
/// would silently move the listener.
///
/// **BUG THIS CATCHES**: Would catch the first-run save happening every run.
#[test]
fn given_existing_config_when_loaded_then_file_is_respected() {
    let temp_dir = TempDir::new().unwrap();
    let paths = AppPaths::from_config_dir(temp_dir.path());
    let saved = ServerConfig::new("9001", "/opt/hibernate.sh");
    saved.save(paths.config_dir()).unwrap();

    let loaded = load_or_create(&paths).unwrap();

    assert_eq!(loaded, saved);
}

/// **VALUE**: Verifies a reload picks up an edited config and moves the listener.
///
/// **WHY THIS MATTERS**: This is the "update config" action end to end.
///
/// **BUG THIS CATCHES**: Would catch a reload reusing the cached config.
#[tokio::test]
async fn given_edited_config_when_reapplied_then_listener_uses_new_script() {
    // GIVEN: Running with an ephemeral port
    let temp_dir = TempDir::new().unwrap();
    let paths = AppPaths::from_config_dir(temp_dir.path());
    ServerConfig::new("0", "/first.sh")
        .save(paths.config_dir())
        .unwrap();
    let coordinator = coordinator();
    let display = spawn_status_display(coordinator.subscribe_status());
    apply_from_disk(&coordinator, &paths).await.unwrap();

    // WHEN: The file is edited and re-applied
    ServerConfig::new("0", "/second.sh")
        .save(paths.config_dir())
        .unwrap();
    let port = apply_from_disk(&coordinator, &paths).await.unwrap();

    // THEN: The active listener reflects the new file
    let active = coordinator.active().await.expect("listener active");
    assert_eq!(active.port, port);
    assert_eq!(active.config.script_path, "/second.sh");
    assert!(coordinator.current_status().is_listening());

    coordinator.shutdown().await.unwrap();
    display.abort();
}

/// **VALUE**: Verifies a broken config is reported and leaves nothing bound.
///
/// **WHY THIS MATTERS**: main keeps running after a failed apply; status must
/// say the listener is down.
///
/// **BUG THIS CATCHES**: Would catch a corrupt file panicking or being
/// replaced with defaults.
#[tokio::test]
async fn given_corrupt_config_when_applied_then_returns_core_error() {
    let temp_dir = TempDir::new().unwrap();
    let paths = AppPaths::from_config_dir(temp_dir.path());
    std::fs::write(ServerConfig::file_path(paths.config_dir()), "{ not json").unwrap();
    let coordinator = coordinator();

    let result = apply_from_disk(&coordinator, &paths).await;

    let err = result.expect_err("corrupt config must not apply");
    assert!(err.to_string().starts_with("Core Error: Config Parse Error"));
    assert!(coordinator.active().await.is_none());
    assert!(matches!(
        coordinator.current_status(),
        ServerStatus::Failed { .. }
    ));
}

/// **VALUE**: Verifies a reload with an invalid port stops the old listener and
/// reports the failure.
///
/// **WHY THIS MATTERS**: A new config always replaces the old one. Leaving the
/// previous listener up would keep the status on `listening:` while the file
/// on disk says something else.
///
/// **BUG THIS CATCHES**: Would catch the port being rejected while loading,
/// before the coordinator ever sees the new config.
#[tokio::test]
async fn given_running_listener_when_reloaded_with_invalid_port_then_unbound_and_failed() {
    // GIVEN: A listener started from a valid file
    let temp_dir = TempDir::new().unwrap();
    let paths = AppPaths::from_config_dir(temp_dir.path());
    ServerConfig::new("0", "/first.sh")
        .save(paths.config_dir())
        .unwrap();
    let coordinator = coordinator();
    let old_port = apply_from_disk(&coordinator, &paths).await.unwrap();

    // WHEN: The file is hand-edited to a non-numeric port and reloaded
    std::fs::write(
        ServerConfig::file_path(paths.config_dir()),
        r#"{"port": "abc", "script_path": "/first.sh"}"#,
    )
    .unwrap();
    let result = apply_from_disk(&coordinator, &paths).await;

    // THEN: Invalid port error, nothing bound, failure status
    let err = result.expect_err("invalid port must not apply");
    assert!(err.to_string().contains("Invalid Port Error"), "{err}");
    assert!(coordinator.active().await.is_none());
    assert!(
        coordinator
            .current_status()
            .to_string()
            .starts_with("error: "),
        "got {}",
        coordinator.current_status()
    );
    assert!(
        std::net::TcpListener::bind(("0.0.0.0", old_port)).is_ok(),
        "old port {old_port} should be released"
    );
}

/// **VALUE**: Verifies an invalid port at startup leaves a failure status.
///
/// **WHY THIS MATTERS**: On first apply there is no old listener to fall back
/// on; the operator must see why nothing is listening.
///
/// **BUG THIS CATCHES**: Would catch the status staying at `ready`.
#[tokio::test]
async fn given_invalid_port_on_disk_when_applied_at_startup_then_status_is_failed() {
    let temp_dir = TempDir::new().unwrap();
    let paths = AppPaths::from_config_dir(temp_dir.path());
    std::fs::write(
        ServerConfig::file_path(paths.config_dir()),
        r#"{"port": "99999", "script_path": "/first.sh"}"#,
    )
    .unwrap();
    let coordinator = coordinator();

    let result = apply_from_disk(&coordinator, &paths).await;

    assert!(result.is_err());
    assert!(matches!(
        coordinator.current_status(),
        ServerStatus::Failed { .. }
    ));
}
