//! Argument validation specs
//!
//! Parse errors must fail before any daemon connection is attempted.

use crate::prelude::*;

#[test]
fn unknown_subcommand_fails() {
    let setup = Setup::new();

    setup.cadence().args(&["frobnicate"]).fails();
}

#[test]
fn ack_rejects_an_unknown_status() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["ack", "alice", "3", "maybe"])
        .fails()
        .stderr_has("expected 'done' or 'not-done'");
}

#[test]
fn file_schedule_rejects_a_malformed_time() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["file", "schedule", "/tmp/notes.pdf", "--at", "tomorrowish"])
        .fails()
        .stderr_has("YYYY-MM-DD HH:MM");
}

#[test]
fn trigger_rejects_a_malformed_date() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["trigger", "--date", "03-02-2026"])
        .fails();
}

#[test]
fn invalid_config_is_reported() {
    let setup = Setup::new();
    std::fs::write(setup.config_path(), "delivery_time = \"25:99\"\n").unwrap();

    setup
        .cadence()
        .args(&["summary"])
        .fails()
        .stderr_has("invalid delivery time");
}

#[test]
fn unknown_config_keys_are_rejected() {
    let setup = Setup::new();
    std::fs::write(setup.config_path(), "delivery_hour = 18\n").unwrap();

    setup.cadence().args(&["summary"]).fails();
}
