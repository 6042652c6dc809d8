use control_core::config::ServerConfig;
use control_core::error::CoreError;
use control_core::error::server::ServerError;
use control_core::trigger::fire;

use std::path::Path;
use std::time::Duration;

/// **VALUE**: Verifies error messages name the kind, the cause and the source
/// location.
///
/// **WHY THIS MATTERS**: Errors only ever reach the log file; without the
/// location a bad bind is hard to trace.
///
/// **BUG THIS CATCHES**: Would catch a Display format that drops the location.
#[tokio::test]
async fn given_invalid_port_when_displayed_then_includes_kind_message_and_location() {
    let server = crate::helpers::test_server(Duration::ZERO);

    let err = server
        .start(&ServerConfig::new("99999", "/tmp/x.sh"))
        .await
        .unwrap_err();
    let text = err.to_string();

    assert!(text.starts_with("Invalid Port Error: "), "{text}");
    assert!(text.contains("99999"), "{text}");
    assert!(text.contains(".rs:"), "{text}");
    assert!(matches!(err, ServerError::InvalidPort { .. }));
}

/// **VALUE**: Verifies module errors convert into `CoreError` transparently.
///
/// **WHY THIS MATTERS**: The app turns core errors into `CoreError` before
/// embedding their text in its own error; the conversion must not change it.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[from]` or a non-transparent
/// wrapper.
#[cfg(unix)]
#[tokio::test]
async fn given_trigger_error_when_converted_to_core_error_then_display_is_unchanged() {
    let err = fire(Path::new("/nonexistent/hibernate.sh")).await.unwrap_err();
    let expected = err.to_string();

    let core: CoreError = err.into();

    assert_eq!(core.to_string(), expected);
    assert!(expected.starts_with("Script Exit Error: "));
}
