//! Daemon lifecycle specs
//!
//! Start/stop/status against an isolated state directory.

use crate::prelude::*;

#[test]
fn daemon_status_reports_not_running() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn daemon_stop_is_a_noop_when_not_running() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn daemon_start_status_stop_cycle() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon started");

    setup
        .cadence()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon running");

    setup
        .cadence()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon stopped");

    setup
        .cadence()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn daemon_start_without_a_token_fails() {
    let setup = Setup::new();
    std::fs::write(
        setup.config_path(),
        format!("state_dir = {:?}\n", setup.state_path()),
    )
    .unwrap();

    setup
        .cadence()
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("no bot token configured");
}
