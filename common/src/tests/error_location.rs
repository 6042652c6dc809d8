use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` records the call site.
///
/// **WHY THIS MATTERS**: Every error in the workspace carries an `ErrorLocation`.
/// If it records the wrong position, log lines for bind and script failures
/// point nowhere useful.
///
/// **BUG THIS CATCHES**: Would catch if file or line capture breaks, e.g. if the
/// constructor starts reading its own location instead of the caller's.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_and_line() {
    // GIVEN: The line we are about to capture
    let expected_line = line!() + 3;

    // WHEN: Creating ErrorLocation from the current position
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should capture this file and line
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path, got {}",
        location.file
    );
    assert_eq!(location.line, expected_line, "Should capture line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the bracketed `[file:line:column]` display format.
///
/// **WHY THIS MATTERS**: Every error message in the app ends with this suffix;
/// the log file is grepped for it when tracking down failures.
///
/// **BUG THIS CATCHES**: Would catch if the Display impl drops the brackets or
/// one of the three components.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A hand-built location
    let location = ErrorLocation {
        file: "src/server/mod.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Should use the bracketed format
    assert_eq!(formatted, "[src/server/mod.rs:42:7]");
}
