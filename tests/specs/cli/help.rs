//! Top-level help and version specs

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["--help"])
        .passes()
        .stdout_has("status")
        .stdout_has("trigger")
        .stdout_has("summary")
        .stdout_has("preview")
        .stdout_has("daemon");
}

#[test]
fn version_is_reported() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["--version"])
        .passes()
        .stdout_has("cadence");
}

#[test]
fn schedule_set_help_documents_flags() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["schedule", "set", "--help"])
        .passes()
        .stdout_has("--start")
        .stdout_has("--days")
        .stdout_has("--frequency");
}
