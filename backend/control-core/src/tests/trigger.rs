// Unit tests for trigger module private functions
// Script execution itself is covered in integration_tests/trigger.rs

use crate::trigger::build_script_command;

use std::ffi::OsStr;
use std::path::Path;

/// **VALUE**: Verifies the script is run through the shell, not executed directly.
///
/// **WHY THIS MATTERS**: Hibernate scripts picked in a file dialog are rarely
/// marked executable. Running them via `sh` works regardless of the mode bits.
///
/// **BUG THIS CATCHES**: Would catch the command being built as `<script>`
/// with no interpreter, which fails with "permission denied".
#[cfg(unix)]
#[test]
fn given_script_path_when_building_command_then_runs_through_sh() {
    // GIVEN: A script path
    let script = Path::new("/tmp/hibernate.sh");

    // WHEN: Building the command
    let cmd = build_script_command(script);

    // THEN: `sh` is the program and the script its only argument
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), OsStr::new("sh"));
    let args: Vec<&OsStr> = std_cmd.get_args().collect();
    assert_eq!(args, vec![OsStr::new("/tmp/hibernate.sh")]);
}
