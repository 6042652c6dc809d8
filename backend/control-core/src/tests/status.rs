use crate::server::{ServerStatus, StatusSink};

/// **VALUE**: Verifies the listening status text the operator sees.
///
/// **WHY THIS MATTERS**: The operator copies this URL into a phone browser.
///
/// **BUG THIS CATCHES**: Would catch format drift in the status line, such as
/// a missing scheme or port.
#[test]
fn given_listening_status_when_displayed_then_shows_url() {
    // GIVEN: A listening status
    let status = ServerStatus::Listening {
        address: String::from("192.168.1.20"),
        port: 8080,
    };

    // WHEN/THEN: Display and url() agree on the address
    assert_eq!(status.to_string(), "listening: http://192.168.1.20:8080");
    assert_eq!(status.url().as_deref(), Some("http://192.168.1.20:8080"));
    assert!(status.is_listening());
}

/// **VALUE**: Verifies failures are shown as an error line, never as blank.
///
/// **WHY THIS MATTERS**: A failed bind used to leave the display stuck on its
/// previous text; the operator had no way to tell the port was taken.
///
/// **BUG THIS CATCHES**: Would catch the failure reason being dropped.
#[test]
fn given_failed_status_when_displayed_then_shows_reason() {
    let status = ServerStatus::Failed {
        reason: String::from("cannot listen on port 80"),
    };

    assert_eq!(status.to_string(), "error: cannot listen on port 80");
    assert_eq!(status.url(), None);
}

/// **VALUE**: Verifies publishing updates both the current value and subscribers.
///
/// **WHY THIS MATTERS**: The display subscribes once at startup and must see
/// every later change.
///
/// **BUG THIS CATCHES**: Would catch a sink that stores the value but never
/// notifies receivers (or vice versa).
#[test]
fn given_subscriber_when_status_published_then_sees_new_value() {
    // GIVEN: A sink and a subscriber
    let sink = StatusSink::new();
    let mut rx = sink.subscribe();
    assert_eq!(sink.current(), ServerStatus::Ready);

    // WHEN: Publishing a new status
    sink.publish(ServerStatus::Binding { port: 8090 });

    // THEN: Both views reflect it
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), ServerStatus::Binding { port: 8090 });
    assert_eq!(sink.current(), ServerStatus::Binding { port: 8090 });
}
