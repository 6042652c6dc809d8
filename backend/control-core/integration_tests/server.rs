use crate::helpers::{MarkerScript, get, test_server, wait_until};

use control_core::config::ServerConfig;
use control_core::error::server::ServerError;
use control_core::server::ServerStatus;
use control_core::{ACTION_ROUTE, INDEX_ROUTE, TRIGGER_DELAY};

use std::net::TcpListener as StdTcpListener;
use std::time::Duration;

use serial_test::serial;
use tokio::time::sleep;

// ============================================================================
// Public API tests for the control server
// These drive a real listener over HTTP
// ============================================================================

/// **VALUE**: End-to-end check of the whole trigger path on a fixed port.
///
/// **WHY THIS MATTERS**: This is the product: tap the button, the script runs
/// once, and a hurried second tap does not run it again.
///
/// **BUG THIS CATCHES**: Would catch the script not being scheduled, being run
/// synchronously, or being run twice for a double submission.
#[tokio::test]
#[serial]
async fn given_listener_on_8090_when_do_requested_twice_then_script_runs_once() {
    // GIVEN: A listener on 8090 with the production trigger delay
    let marker = MarkerScript::new();
    let server = test_server(TRIGGER_DELAY);
    let handle = server
        .start(&ServerConfig::new("8090", marker.script()))
        .await
        .expect("Should bind 8090");

    // WHEN: Requesting the action route
    let first = get(8090, ACTION_ROUTE).await.expect("first request");

    // THEN: The confirmation page comes back before the script has run
    assert_eq!(first.status(), 200);
    assert_eq!(
        first.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    assert_eq!(marker.runs(), 0, "script must wait for the trigger delay");

    // AND: An immediate repeat is rejected
    let second = get(8090, ACTION_ROUTE).await.expect("second request");
    assert_eq!(second.status(), 429);

    // AND: The marker appears within the deadline, exactly once
    assert!(
        wait_until(Duration::from_secs(3), || marker.runs() >= 1).await,
        "marker file should be written after the trigger delay"
    );
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(marker.runs(), 1, "second request must not trigger again");

    server.stop(Some(handle)).await;
}

/// **VALUE**: Verifies requests spaced past the cooldown both fire.
///
/// **WHY THIS MATTERS**: Debounce must suppress double taps, not lock the
/// button for the rest of the session.
///
/// **BUG THIS CATCHES**: Would catch a timestamp that is set but never
/// compared, or compared against the wrong instant.
#[tokio::test]
#[serial]
async fn given_requests_3_5s_apart_when_do_requested_then_both_fire() {
    // GIVEN: A listener with an immediate trigger
    let marker = MarkerScript::new();
    let server = test_server(Duration::ZERO);
    let handle = server
        .start(&ServerConfig::new("0", marker.script()))
        .await
        .unwrap();
    let port = handle.port();

    // WHEN: Two requests 3.5 seconds apart
    let first = get(port, ACTION_ROUTE).await.unwrap();
    sleep(Duration::from_millis(3_500)).await;
    let second = get(port, ACTION_ROUTE).await.unwrap();

    // THEN: Both are accepted and the script ran twice
    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 200);
    assert!(wait_until(Duration::from_secs(2), || marker.runs() == 2).await);

    server.stop(Some(handle)).await;
}

/// **VALUE**: Verifies the index route serves the control page.
///
/// **WHY THIS MATTERS**: It is the only page the phone ever opens directly.
///
/// **BUG THIS CATCHES**: Would catch a missing route, wrong content type, or a
/// button that no longer points at the action route.
#[tokio::test]
async fn given_listener_when_index_requested_then_returns_control_page() {
    let marker = MarkerScript::new();
    let server = test_server(Duration::ZERO);
    let handle = server
        .start(&ServerConfig::new("0", marker.script()))
        .await
        .unwrap();

    let response = get(handle.port(), INDEX_ROUTE).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    let body = response.text().await.unwrap();
    assert!(body.contains("<button"), "page should have the action button");
    assert!(body.contains("confirm("), "page should ask for confirmation");
    assert!(body.contains(ACTION_ROUTE), "button should navigate to the action route");
    assert_eq!(marker.runs(), 0, "index must never trigger the script");

    server.stop(Some(handle)).await;
}

/// **VALUE**: Verifies status reporting across a full start/stop cycle.
///
/// **WHY THIS MATTERS**: The status line is the operator's only view of
/// whether the phone can reach the machine.
///
/// **BUG THIS CATCHES**: Would catch the listening URL using the wrong port,
/// or `stop` never publishing.
#[tokio::test]
async fn given_server_when_started_and_stopped_then_status_follows_lifecycle() {
    let server = test_server(Duration::ZERO);
    assert_eq!(server.status().current(), ServerStatus::Ready);

    let handle = server
        .start(&ServerConfig::new("0", "/nonexistent/script.sh"))
        .await
        .unwrap();
    let port = handle.port();

    let status = server.status().current();
    assert!(status.is_listening(), "got {status}");
    assert!(status.to_string().starts_with("listening: http://"));
    assert!(status.to_string().ends_with(&format!(":{port}")));

    server.stop(Some(handle)).await;
    assert_eq!(server.status().current(), ServerStatus::Stopped);
    assert!(get(port, INDEX_ROUTE).await.is_err(), "port should be closed");
}

/// **VALUE**: Verifies `stop` with no active handle is harmless.
///
/// **WHY THIS MATTERS**: Quit and the first apply both call stop without
/// knowing whether anything is running.
///
/// **BUG THIS CATCHES**: Would catch a panic or a bogus status change.
#[tokio::test]
async fn given_no_handle_when_stop_called_then_does_nothing() {
    let server = test_server(Duration::ZERO);

    server.stop(None).await;

    assert_eq!(server.status().current(), ServerStatus::Ready);
}

/// **VALUE**: Verifies a taken port surfaces as a bind error and failure status.
///
/// **WHY THIS MATTERS**: A silent bind failure leaves the operator staring at
/// "starting" forever while the phone gets connection refused.
///
/// **BUG THIS CATCHES**: Would catch bind errors being swallowed, or a hang.
#[tokio::test]
async fn given_port_in_use_when_started_then_returns_bind_error_and_failed_status() {
    // GIVEN: Someone else already listens on the port
    let squatter = StdTcpListener::bind("0.0.0.0:0").unwrap();
    let port = squatter.local_addr().unwrap().port();
    let server = test_server(Duration::ZERO);

    // WHEN: Starting on that port
    let result = server
        .start(&ServerConfig::new(port.to_string(), "/tmp/x.sh"))
        .await;

    // THEN: Bind error, failure status
    assert!(matches!(result, Err(ServerError::Bind { .. })), "{result:?}");
    assert!(matches!(
        server.status().current(),
        ServerStatus::Failed { .. }
    ));
}

/// **VALUE**: Verifies a non-numeric port is rejected before any bind.
///
/// **WHY THIS MATTERS**: The port is free text in the settings form.
///
/// **BUG THIS CATCHES**: Would catch a panic on parse or a bind attempt on a
/// garbage address.
#[tokio::test]
async fn given_invalid_port_when_started_then_returns_invalid_port_error() {
    let server = test_server(Duration::ZERO);

    let result = server
        .start(&ServerConfig::new("eighty", "/tmp/x.sh"))
        .await;

    assert!(matches!(result, Err(ServerError::InvalidPort { .. })));
    assert!(server.status().current().to_string().starts_with("error: "));
}

/// **VALUE**: Verifies the cooldown survives a listener restart.
///
/// **WHY THIS MATTERS**: Changing settings right after a tap must not open a
/// window for a second hibernate.
///
/// **BUG THIS CATCHES**: Would catch the timestamp being created per listener.
#[tokio::test]
async fn given_recent_trigger_when_listener_restarted_then_cooldown_still_applies() {
    let marker = MarkerScript::new();
    let server = test_server(Duration::ZERO);
    let config = ServerConfig::new("0", marker.script());

    let first_handle = server.start(&config).await.unwrap();
    let accepted = get(first_handle.port(), ACTION_ROUTE).await.unwrap();
    assert_eq!(accepted.status(), 200);
    server.stop(Some(first_handle)).await;

    let second_handle = server.start(&config).await.unwrap();
    let rejected = get(second_handle.port(), ACTION_ROUTE).await.unwrap();
    assert_eq!(rejected.status(), 429);

    server.stop(Some(second_handle)).await;
}
