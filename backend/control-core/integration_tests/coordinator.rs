use crate::helpers::{MarkerScript, get, test_server};

use control_core::config::ServerConfig;
use control_core::coordinator::LifecycleCoordinator;
use control_core::error::server::ServerError;
use control_core::server::ServerStatus;
use control_core::INDEX_ROUTE;

use std::time::Duration;

use serial_test::serial;

fn coordinator() -> LifecycleCoordinator {
    LifecycleCoordinator::new(test_server(Duration::ZERO))
}

/// **VALUE**: Verifies a settings change moves the listener.
///
/// **WHY THIS MATTERS**: Exactly one listener may exist at any time; the old
/// port must be free once the new one is up.
///
/// **BUG THIS CATCHES**: Would catch the old handle leaking and still serving.
#[tokio::test]
#[serial]
async fn given_listener_on_8091_when_8092_applied_then_only_8092_serves() {
    // GIVEN: Listening on 8091
    let marker = MarkerScript::new();
    let coordinator = coordinator();
    let first = coordinator
        .apply_config(ServerConfig::new("8091", marker.script()))
        .await
        .expect("8091 should bind");
    assert_eq!(first, 8091);

    // WHEN: Applying 8092
    let second = coordinator
        .apply_config(ServerConfig::new("8092", marker.script()))
        .await
        .expect("8092 should bind");

    // THEN: 8091 refuses connections, 8092 answers
    assert_eq!(second, 8092);
    let old = get(8091, INDEX_ROUTE).await;
    assert!(
        old.as_ref().is_err_and(|e| e.is_connect()),
        "8091 should be closed, got {old:?}"
    );
    let new = get(8092, INDEX_ROUTE).await.expect("8092 should answer");
    assert_eq!(new.status(), 200);
    assert_eq!(coordinator.active().await.map(|a| a.port), Some(8092));

    coordinator.shutdown().await.unwrap();
}

/// **VALUE**: Verifies overlapping applies end with exactly one listener.
///
/// **WHY THIS MATTERS**: Two settings saves in quick succession must not race
/// a stop of one into the start of the other.
///
/// **BUG THIS CATCHES**: Would catch two listeners surviving, or neither.
#[tokio::test]
#[serial]
async fn given_concurrent_applies_when_both_complete_then_exactly_one_listener_remains() {
    let marker = MarkerScript::new();
    let coordinator = coordinator();
    let other = coordinator.clone();

    let (a, b) = tokio::join!(
        coordinator.apply_config(ServerConfig::new("8093", marker.script())),
        other.apply_config(ServerConfig::new("8094", marker.script())),
    );
    assert!(a.is_ok() && b.is_ok(), "{a:?} {b:?}");

    let active = coordinator.active().await.expect("one listener active");
    let (live, dead) = if active.port == 8093 {
        (8093, 8094)
    } else {
        (8094, 8093)
    };

    assert!(get(live, INDEX_ROUTE).await.is_ok());
    assert!(get(dead, INDEX_ROUTE).await.is_err());
    assert_eq!(
        coordinator.current_status(),
        ServerStatus::Listening {
            address: control_core::locator::get_local_address(),
            port: live
        }
    );

    coordinator.shutdown().await.unwrap();
}

/// **VALUE**: Verifies shutdown releases the port and is safe when idle.
///
/// **WHY THIS MATTERS**: Quit calls shutdown whether or not anything started.
///
/// **BUG THIS CATCHES**: Would catch a panic on an empty coordinator, or the
/// port staying bound after quit.
#[tokio::test]
async fn given_coordinator_when_shutdown_then_nothing_is_active() {
    let coordinator = coordinator();
    coordinator.shutdown().await.expect("idle shutdown is fine");

    let port = coordinator
        .apply_config(ServerConfig::new("0", "/tmp/x.sh"))
        .await
        .unwrap();
    coordinator.shutdown().await.unwrap();

    assert!(coordinator.active().await.is_none());
    assert_eq!(coordinator.current_status(), ServerStatus::Stopped);
    assert!(get(port, INDEX_ROUTE).await.is_err());
}

/// **VALUE**: Verifies a failed apply does not leave the old listener behind.
///
/// **WHY THIS MATTERS**: Status must match reality: after a failed start
/// nothing is bound and the status says so.
///
/// **BUG THIS CATCHES**: Would catch `active()` still reporting the old port.
#[tokio::test]
async fn given_running_listener_when_invalid_config_applied_then_nothing_is_active() {
    let coordinator = coordinator();
    let old_port = coordinator
        .apply_config(ServerConfig::new("0", "/tmp/x.sh"))
        .await
        .unwrap();

    let result = coordinator
        .apply_config(ServerConfig::new("not-a-port", "/tmp/x.sh"))
        .await;

    assert!(matches!(result, Err(ServerError::InvalidPort { .. })));
    assert!(coordinator.active().await.is_none());
    assert!(matches!(
        coordinator.current_status(),
        ServerStatus::Failed { .. }
    ));
    assert!(get(old_port, INDEX_ROUTE).await.is_err());
}

/// **VALUE**: Verifies status subscribers see the listening state.
///
/// **WHY THIS MATTERS**: The status display only ever reads the subscription.
///
/// **BUG THIS CATCHES**: Would catch publishes going to a different channel.
#[tokio::test]
async fn given_subscriber_when_config_applied_then_sees_listening_status() {
    let coordinator = coordinator();
    let mut rx = coordinator.subscribe_status();

    let port = coordinator
        .apply_config(ServerConfig::new("0", "/tmp/x.sh"))
        .await
        .unwrap();

    assert!(rx.has_changed().unwrap());
    let status = rx.borrow_and_update().clone();
    assert_eq!(status.url().map(|u| u.ends_with(&format!(":{port}"))), Some(true));

    coordinator.shutdown().await.unwrap();
}
